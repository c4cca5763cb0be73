//! Storage seams for the recommender.
//!
//! Every store is an explicit object constructed once in `main` and injected
//! where needed. Backends: in-memory (default), Redis (embedding cache) and
//! PostgreSQL (feedback and profiles).

use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{FeedbackRecord, Profile},
};

pub mod memory;
pub mod postgres;
pub mod redis;
pub mod sessions;

pub use memory::{MemoryEmbeddingStore, MemoryFeedbackStore, MemoryProfileStore};
pub use postgres::{create_pool, PgFeedbackStore, PgProfileStore};
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisEmbeddingStore};
pub use sessions::{Session, SessionStore};

/// A cached vector together with the text it was computed from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub source_text: String,
    pub vector: Vec<f64>,
}

/// Key-value store of previously computed embeddings
///
/// Keys are content ids or namespaced keys such as `pref:<normalized text>`.
/// `put` overwrites (last write wins); there is no expiry.
#[async_trait::async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<f64>>>;

    async fn put(&self, key: &str, source_text: &str, vector: &[f64]) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Persistence of user feedback
#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn save(&self, record: &FeedbackRecord) -> AppResult<()>;

    /// All of the user's records with `liked == true`, oldest first
    async fn load_liked_feedback(&self, user_id: &str) -> AppResult<Vec<FeedbackRecord>>;
}

/// Persistence of named preference profiles
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts or replaces the profile with the same `(user_id, name)`
    async fn save(&self, profile: &Profile) -> AppResult<()>;

    async fn list(&self, user_id: &str) -> AppResult<Vec<Profile>>;

    async fn get(&self, user_id: &str, name: &str) -> AppResult<Option<Profile>>;
}
