//! Saved-post storage.
//!
//! Records are stored as JSON objects keyed by post ID. Saving a post that is
//! already stored merges the fresh record over the stored object: every field
//! the classifier produces is overwritten, anything else already stored
//! (annotations added by other tools, fields from older versions) is kept.

mod export;
mod memory;
mod migrations;
mod sqlite;

pub use export::{export_file_name, export_json, format_usage, list_saved};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::classifier::PostRecord;

/// Storage collaborator for saved posts.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Save a record, merging over any stored record with the same ID.
    async fn put(&self, record: &PostRecord) -> Result<()>;

    /// Fetch one saved record.
    async fn get(&self, id: &str) -> Result<Option<PostRecord>>;

    /// All saved records keyed by ID.
    async fn get_all(&self) -> Result<BTreeMap<String, PostRecord>>;

    /// All stored objects keyed by ID, including fields unknown to
    /// [`PostRecord`].
    async fn get_all_raw(&self) -> Result<BTreeMap<String, Value>>;

    /// Remove a record. Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Remove every record. Returns `true` once the store is empty.
    async fn clear(&self) -> Result<bool>;

    /// Bytes occupied by the serialized records.
    async fn usage_bytes(&self) -> Result<u64>;

    /// Whether a record with this ID is saved.
    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }
}

/// Key older records used for the quoted post.
const LEGACY_QUOTED_KEY: &str = "quotedTweet";

/// Merge a fresh record over a previously stored object.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn merge_record(existing: Option<Value>, record: &PostRecord) -> Result<Value> {
    let fresh = serde_json::to_value(record).context("Failed to serialize post record")?;
    match (existing, fresh) {
        (Some(Value::Object(mut stored)), Value::Object(fresh)) => {
            // Older records name the quoted post differently; keeping both
            // keys would make the merged object undecodable.
            stored.remove(LEGACY_QUOTED_KEY);
            stored.extend(fresh);
            Ok(Value::Object(stored))
        }
        (_, fresh) => Ok(fresh),
    }
}

fn decode_record(id: &str, value: Value) -> Result<PostRecord> {
    serde_json::from_value(value).with_context(|| format!("Failed to decode stored post {id}"))
}
