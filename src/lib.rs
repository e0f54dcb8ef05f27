//! Tweet tracker library.
//!
//! Classifies rendered X/Twitter post cards as original posts, replies,
//! reposts or quotes, extracts a canonical record from each, and stores the
//! records a user bookmarks.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod classifier;
pub mod config;
pub mod constants;
pub mod dom;
pub mod session;
pub mod store;

pub use classifier::{Classifier, PostRecord, PostType};
pub use dom::{CardNode, HtmlSnapshot, Marker};

/// Classify every top-level card of an HTML snapshot.
///
/// Cards that cannot be extracted are skipped.
#[must_use]
pub fn classify_snapshot(classifier: &Classifier, html: &str) -> Vec<PostRecord> {
    let snapshot = HtmlSnapshot::parse(html);
    snapshot
        .top_level_cards()
        .iter()
        .filter_map(|card| classifier.classify(card))
        .collect()
}
