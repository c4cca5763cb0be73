use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    db::EmbeddingStore,
    error::{AppError, AppResult},
};

/// Text -> fixed-length vector, computed by an external model
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> AppResult<Vec<f64>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

/// OpenAI-compatible `/embeddings` endpoint
#[derive(Clone)]
pub struct OpenAiEmbedder {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f64>> {
        let url = format!("{}/embeddings", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Embedding API returned status {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::ExternalApi("Embedding API returned no vector".to_string()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Embedding lookups through the cache, falling back to the provider
///
/// The cache fails open: a backend error is logged and treated as a miss.
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn EmbeddingStore>,
    timeout: Duration,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn EmbeddingStore>, timeout: Duration) -> Self {
        Self {
            embedder,
            store,
            timeout,
        }
    }

    async fn cached(&self, key: &str) -> Option<Vec<f64>> {
        match self.store.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %key,
                    backend = self.store.name(),
                    "Embedding cache read failed, treating as miss"
                );
                None
            }
        }
    }

    /// Calls the provider directly, bounded by the configured timeout
    pub async fn embed_uncached(&self, text: &str) -> AppResult<Vec<f64>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput(
                "Embedding input cannot be empty".to_string(),
            ));
        }

        tokio::time::timeout(self.timeout, self.embedder.embed(text))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "{} embedding after {}s",
                    self.embedder.name(),
                    self.timeout.as_secs()
                ))
            })?
    }

    /// Returns the vector cached under `key`, computing and storing it on a miss
    #[instrument(skip(self, text))]
    pub async fn get_or_embed(&self, key: &str, text: &str) -> AppResult<Vec<f64>> {
        if let Some(vector) = self.cached(key).await {
            tracing::debug!("Embedding cache hit");
            return Ok(vector);
        }

        let vector = self.embed_uncached(text).await?;

        if let Err(e) = self.store.put(key, text.trim(), &vector).await {
            tracing::warn!(
                error = %e,
                backend = self.store.name(),
                "Embedding cache write failed"
            );
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEmbeddingStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> AppResult<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f64, 1.0])
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct SlowEmbedder;

    #[async_trait::async_trait]
    impl Embedder for SlowEmbedder {
        async fn embed(&self, _text: &str) -> AppResult<Vec<f64>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1.0])
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl EmbeddingStore for BrokenStore {
        async fn get(&self, _key: &str) -> AppResult<Option<Vec<f64>>> {
            Err(AppError::Internal("connection refused".to_string()))
        }

        async fn put(&self, _key: &str, _source_text: &str, _vector: &[f64]) -> AppResult<()> {
            Err(AppError::Internal("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryEmbeddingStore::new());
        let service = EmbeddingService::new(embedder.clone(), store.clone(), Duration::from_secs(5));

        let first = service.get_or_embed("item-1", "Alien space horror").await.unwrap();
        let second = service.get_or_embed("item-1", "Alien space horror").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.entry("item-1").await.unwrap().source_text,
            "Alien space horror"
        );
    }

    #[tokio::test]
    async fn test_cache_failure_fails_open() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let service = EmbeddingService::new(embedder.clone(), Arc::new(BrokenStore), Duration::from_secs(5));

        let vector = service.get_or_embed("item-1", "abc").await.unwrap();
        assert_eq!(vector, vec![3.0, 1.0]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let service = EmbeddingService::new(embedder.clone(), Arc::new(MemoryEmbeddingStore::new()), Duration::from_secs(5));

        let result = service.get_or_embed("blank", "   ").await;
        tokio_test::assert_err!(result);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout() {
        let service = EmbeddingService::new(
            Arc::new(SlowEmbedder),
            Arc::new(MemoryEmbeddingStore::new()),
            Duration::from_secs(2),
        );

        let err = service.get_or_embed("item-1", "text").await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
    }

    #[test]
    fn test_embedding_response_deserialization() {
        let json = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,-0.2]}],"model":"text-embedding-3-small"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, -0.2]);
    }
}
