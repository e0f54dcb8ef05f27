use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{decode_record, merge_record, PostStore};
use crate::classifier::PostRecord;

/// In-process [`PostStore`], for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn put(&self, record: &PostRecord) -> Result<()> {
        let mut posts = self.posts.write().await;
        let merged = merge_record(posts.remove(&record.id), record)?;
        posts.insert(record.id.clone(), merged);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        let posts = self.posts.read().await;
        posts
            .get(id)
            .map(|value| decode_record(id, value.clone()))
            .transpose()
    }

    async fn get_all(&self) -> Result<BTreeMap<String, PostRecord>> {
        let posts = self.posts.read().await;
        posts
            .iter()
            .map(|(id, value)| Ok((id.clone(), decode_record(id, value.clone())?)))
            .collect()
    }

    async fn get_all_raw(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self.posts.read().await.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.posts.write().await.remove(id).is_some())
    }

    async fn clear(&self) -> Result<bool> {
        self.posts.write().await.clear();
        Ok(true)
    }

    async fn usage_bytes(&self) -> Result<u64> {
        let posts = self.posts.read().await;
        let mut total = 0u64;
        for value in posts.values() {
            let json = serde_json::to_string(value).context("Failed to serialize post")?;
            total += json.len() as u64;
        }
        Ok(total)
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.posts.read().await.contains_key(id))
    }
}
