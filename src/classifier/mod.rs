//! Post-type classification and record extraction.
//!
//! [`Classifier::classify`] inspects one rendered card and assigns exactly one
//! [`PostType`], in fixed priority order:
//!
//! 1. **quote**: the card embeds another post;
//! 2. **repost**: the social-context annotation announces a repost;
//! 3. **reply**: any reply signal fires;
//! 4. **tweet**: nothing else matched.
//!
//! Classification is a pure function of the card's current subtree apart from
//! the extraction timestamp, so callers re-run it whenever the subtree may
//! have changed instead of caching by card identity.

mod fields;
mod record;
mod rules;

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::default_origin;
use crate::constants::{
    DEFAULT_THREAD_MAX_DEPTH, DEFAULT_THREAD_MAX_SIBLINGS, DEFAULT_THREAD_MIN_SIBLINGS,
};
use crate::dom::{CardNode, Marker};

pub use fields::{absolutize, count_status_segments, extract_status_id, split_author};
pub use record::{Author, PostRecord, PostType, QuotedPost, UnknownPostType};

use rules::CardContext;

/// Disambiguates synthetic IDs minted within the same millisecond.
static SYNTHETIC_ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Fallback ID for a card whose status link carries no numeric ID.
fn synthetic_id(now: DateTime<Utc>) -> String {
    let seq = SYNTHETIC_ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq}", now.timestamp_millis())
}

/// Reasons a card cannot be turned into a record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("card has no status link")]
    MissingStatusLink,
    #[error("status link has no href")]
    MissingHref,
    #[error("invalid link {href}: {source}")]
    InvalidLink {
        href: String,
        #[source]
        source: url::ParseError,
    },
}

/// Tunables for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Origin relative links are resolved against.
    pub site_origin: Url,
    /// Top-level sibling counts that mark a conversation thread.
    pub thread_siblings: RangeInclusive<usize>,
    /// Ancestors inspected by the thread-structure rule.
    pub thread_max_depth: usize,
    /// Emit the signal trace as a debug event for every card.
    pub debug_signals: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            site_origin: default_origin(),
            thread_siblings: DEFAULT_THREAD_MIN_SIBLINGS..=DEFAULT_THREAD_MAX_SIBLINGS,
            thread_max_depth: DEFAULT_THREAD_MAX_DEPTH,
            debug_signals: false,
        }
    }
}

/// Which detection rules fired for a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    /// The social-context annotation announced a repost.
    pub social_context_repost: bool,
    /// Quote rule that located the embedded card.
    pub quote_rule: Option<&'static str>,
    /// Reply rule that fired, if the reply tier was reached and matched.
    pub reply_rule: Option<&'static str>,
    /// `/status/<id>` segments in the main link.
    pub link_status_count: usize,
}

/// A record together with the signals that produced its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub record: PostRecord,
    pub signals: Signals,
}

/// Stateless card classifier.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    #[must_use]
    pub const fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a card, stamping it with the current time.
    ///
    /// Returns `None` when the card cannot be extracted; callers should skip
    /// the card (or retry after it re-renders), not treat it as a plain post.
    pub fn classify<N: CardNode>(&self, card: &N) -> Option<PostRecord> {
        self.classify_at(card, Utc::now())
    }

    /// Classify a card as of `now`.
    pub fn classify_at<N: CardNode>(&self, card: &N, now: DateTime<Utc>) -> Option<PostRecord> {
        self.classify_traced(card, now).map(|c| c.record)
    }

    /// Classify a card and keep the signal trace.
    pub fn classify_traced<N: CardNode>(
        &self,
        card: &N,
        now: DateTime<Utc>,
    ) -> Option<Classification> {
        match self.try_classify(card, now) {
            Ok(classification) => Some(classification),
            Err(e) => {
                warn!(error = %e, "Failed to extract post card");
                None
            }
        }
    }

    /// Classify a card, reporting why extraction failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the card has no usable status link.
    pub fn try_classify<N: CardNode>(
        &self,
        card: &N,
        now: DateTime<Utc>,
    ) -> Result<Classification, ExtractError> {
        let origin = &self.config.site_origin;

        let text = fields::read_text(card);
        let author = fields::read_author(card);
        let (datetime, date_text) = fields::read_timestamp(card);

        let href = card
            .find_first(Marker::StatusLink)
            .ok_or(ExtractError::MissingStatusLink)?
            .attr("href")
            .ok_or(ExtractError::MissingHref)?;
        let link = absolutize(&href, origin)?;
        let post_id = extract_status_id(&link);

        let social_context_repost = card
            .find_first(Marker::SocialContext)
            .is_some_and(|el| rules::is_repost_context(&el.text()));

        let ctx = CardContext {
            card,
            text: &text,
            link: &link,
            repost_context: social_context_repost,
            config: &self.config,
        };

        let mut signals = Signals {
            social_context_repost,
            link_status_count: count_status_segments(&link),
            ..Signals::default()
        };

        let mut quoted_post = None;
        let post_type = if let Some((rule, boundary)) = rules::find_quote(&ctx) {
            signals.quote_rule = Some(rule);
            quoted_post = Some(self.extract_quoted(&boundary, post_id.as_deref())?);
            PostType::Quote
        } else if social_context_repost {
            PostType::Repost
        } else if let Some(rule) = rules::find_reply(&ctx) {
            signals.reply_rule = Some(rule);
            PostType::Reply
        } else {
            PostType::Tweet
        };

        // The card's own author block shows the reposted post's author.
        let original_author = if post_type == PostType::Repost {
            author.name.clone()
        } else {
            String::new()
        };

        let has_media = card.find_first(Marker::Media).is_some();
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let record = PostRecord {
            id: post_id.unwrap_or_else(|| synthetic_id(now)),
            text,
            author,
            date: datetime.unwrap_or_else(|| timestamp.clone()),
            date_text,
            link,
            post_type,
            original_author,
            quoted_post,
            has_media,
            saved_at: timestamp,
        };

        if self.config.debug_signals {
            debug!(
                post_id = %record.id,
                post_type = %record.post_type,
                signals = ?signals,
                "Type detection signals"
            );
        }

        Ok(Classification { record, signals })
    }

    /// Extract the embedded post inside a quote boundary.
    ///
    /// The quoted link must point at a different post than the outer card:
    /// the outer status link often also appears inside the boundary.
    fn extract_quoted<N: CardNode>(
        &self,
        boundary: &N,
        outer_id: Option<&str>,
    ) -> Result<QuotedPost, ExtractError> {
        let href = fields::first_distinct_status_link(boundary, outer_id).or_else(|| {
            boundary
                .closest(Marker::LinkContainer)
                .or_else(|| boundary.parent())
                .and_then(|container| fields::first_distinct_status_link(&container, outer_id))
        });

        let link = match href {
            Some(href) => absolutize(&href, &self.config.site_origin)?,
            None => String::new(),
        };

        Ok(QuotedPost {
            text: fields::read_text(boundary),
            author: fields::read_author(boundary),
            link,
        })
    }
}
