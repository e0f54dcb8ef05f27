use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};

use super::PostStore;
use crate::classifier::{PostRecord, PostType};
use crate::constants::EXPORT_FILE_PREFIX;

/// Pretty-printed JSON backup of every stored post, keyed by ID.
///
/// Exports the stored objects as-is, so merged-in fields survive a
/// backup/restore cycle.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn export_json(store: &dyn PostStore) -> Result<String> {
    let posts = store.get_all_raw().await?;
    serde_json::to_string_pretty(&posts).context("Failed to serialize export")
}

/// File name for a backup taken on `date`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("{EXPORT_FILE_PREFIX}-{}.json", date.format("%Y-%m-%d"))
}

/// Saved records, optionally restricted to one type, newest save first.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn list_saved(
    store: &dyn PostStore,
    filter: Option<PostType>,
) -> Result<Vec<PostRecord>> {
    let mut records: Vec<PostRecord> = store
        .get_all()
        .await?
        .into_values()
        .filter(|record| filter.map_or(true, |t| record.post_type == t))
        .collect();

    records.sort_by_cached_key(|record| {
        std::cmp::Reverse(
            DateTime::parse_from_rfc3339(&record.saved_at)
                .map(|dt| dt.timestamp_millis())
                .unwrap_or(i64::MIN),
        )
    });
    Ok(records)
}

/// Human-readable storage size.
#[must_use]
pub fn format_usage(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}
