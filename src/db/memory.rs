use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{CacheEntry, EmbeddingStore, FeedbackStore, ProfileStore};
use crate::{
    error::AppResult,
    models::{FeedbackRecord, Profile},
};

/// Process-local embedding store
#[derive(Default)]
pub struct MemoryEmbeddingStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryEmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Full entry including source text
    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }
}

#[async_trait::async_trait]
impl EmbeddingStore for MemoryEmbeddingStore {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<f64>>> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.vector.clone()))
    }

    async fn put(&self, key: &str, source_text: &str, vector: &[f64]) -> AppResult<()> {
        let entry = CacheEntry {
            key: key.to_string(),
            source_text: source_text.to_string(),
            vector: vector.to_vec(),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Feedback kept for the lifetime of the process
#[derive(Default)]
pub struct MemoryFeedbackStore {
    records: RwLock<Vec<FeedbackRecord>>,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn save(&self, record: &FeedbackRecord) -> AppResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn load_liked_feedback(&self, user_id: &str) -> AppResult<Vec<FeedbackRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && r.liked)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    /// user_id -> (profile name -> profile)
    profiles: RwLock<HashMap<String, HashMap<String, Profile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn save(&self, profile: &Profile) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .entry(profile.user_id.clone())
            .or_default()
            .insert(profile.name.clone(), profile.clone());
        Ok(())
    }

    async fn list(&self, user_id: &str) -> AppResult<Vec<Profile>> {
        let profiles = self.profiles.read().await;
        let mut list: Vec<Profile> = profiles
            .get(user_id)
            .map(|by_name| by_name.values().cloned().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn get(&self, user_id: &str, name: &str) -> AppResult<Option<Profile>> {
        Ok(self
            .profiles
            .read()
            .await
            .get(user_id)
            .and_then(|by_name| by_name.get(name))
            .cloned())
    }
}
