use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::{future::join_all, stream, StreamExt};

use crate::{
    error::AppError,
    models::{ContentItem, Preferences},
    services::{embeddings::EmbeddingService, providers::ContentSource},
};

/// Candidates ready for scoring, plus what went missing on the way
#[derive(Debug, Default)]
pub struct CandidatePool {
    /// Unique by id, in source order, each with an embedding
    pub items: Vec<ContentItem>,
    /// Sources that failed or timed out
    pub failed_sources: Vec<&'static str>,
    /// Items dropped because no embedding could be obtained
    pub skipped_items: usize,
}

/// Builds the candidate pool from every configured content source
pub struct CandidateAggregator {
    sources: Vec<Arc<dyn ContentSource>>,
    embeddings: Arc<EmbeddingService>,
    source_timeout: Duration,
    embed_concurrency: usize,
}

impl CandidateAggregator {
    pub fn new(
        sources: Vec<Arc<dyn ContentSource>>,
        embeddings: Arc<EmbeddingService>,
        source_timeout: Duration,
        embed_concurrency: usize,
    ) -> Self {
        Self {
            sources,
            embeddings,
            source_timeout,
            embed_concurrency: embed_concurrency.max(1),
        }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Gathers up to `pool_size` unique, embedded candidates for `preferences`.
    ///
    /// Never fails: a source outage or an item that cannot be embedded only
    /// shrinks the pool and is reported on the returned `CandidatePool`.
    pub async fn gather(&self, preferences: &Preferences, pool_size: usize) -> CandidatePool {
        let mut pool = CandidatePool::default();
        if pool_size == 0 || self.sources.is_empty() {
            return pool;
        }

        let query = preferences.query_text();
        let per_source = pool_size.div_ceil(self.sources.len());

        let fetches = self.sources.iter().map(|source| {
            let query = query.as_str();
            async move {
                let result =
                    tokio::time::timeout(self.source_timeout, source.fetch_candidates(query, per_source))
                        .await
                        .unwrap_or_else(|_| {
                            Err(AppError::Timeout(format!(
                                "{} after {}s",
                                source.name(),
                                self.source_timeout.as_secs()
                            )))
                        });
                (source.name(), result)
            }
        });

        let mut seen = HashSet::new();
        let mut unique = Vec::new();

        // join_all keeps source order regardless of completion order
        for (name, result) in join_all(fetches).await {
            match result {
                Ok(raw_items) => {
                    for item in raw_items.into_iter().filter_map(|raw| raw.into_content_item()) {
                        if seen.insert(item.id.clone()) {
                            unique.push(item);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(source = name, error = %e, "Content source failed, continuing without it");
                    pool.failed_sources.push(name);
                }
            }
        }
        unique.truncate(pool_size);

        let embedded: Vec<Option<ContentItem>> = stream::iter(unique)
            .map(|item| self.attach_embedding(item))
            .buffered(self.embed_concurrency)
            .collect()
            .await;

        for item in embedded {
            match item {
                Some(item) => pool.items.push(item),
                None => pool.skipped_items += 1,
            }
        }

        tracing::info!(
            candidates = pool.items.len(),
            skipped = pool.skipped_items,
            failed_sources = pool.failed_sources.len(),
            "Candidate pool built"
        );

        pool
    }

    async fn attach_embedding(&self, mut item: ContentItem) -> Option<ContentItem> {
        if item.embedding.is_some() {
            return Some(item);
        }

        match self
            .embeddings
            .get_or_embed(&item.id, &item.embedding_text())
            .await
        {
            Ok(vector) => {
                item.embedding = Some(vector);
                Some(item)
            }
            Err(e) => {
                tracing::warn!(item_id = %item.id, error = %e, "Skipping item without embedding");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryEmbeddingStore,
        error::AppResult,
        models::RawItem,
        services::{embeddings::Embedder, providers::MockContentSource},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LengthEmbedder;

    #[async_trait::async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> AppResult<Vec<f64>> {
            if text.contains("unembeddable") {
                return Err(AppError::ExternalApi("model refused input".to_string()));
            }
            Ok(vec![text.len() as f64, 1.0])
        }

        fn name(&self) -> &'static str {
            "length"
        }
    }

    fn raw(id: &str, title: &str) -> RawItem {
        RawItem {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            platform: "test".to_string(),
            ..Default::default()
        }
    }

    fn mock_source(name: &'static str, items: Vec<RawItem>) -> Arc<dyn ContentSource> {
        let mut source = MockContentSource::new();
        source.expect_name().return_const(name);
        source
            .expect_fetch_candidates()
            .returning(move |_, _| Ok(items.clone()));
        Arc::new(source)
    }

    fn failing_source(name: &'static str) -> Arc<dyn ContentSource> {
        let mut source = MockContentSource::new();
        source.expect_name().return_const(name);
        source
            .expect_fetch_candidates()
            .returning(|_, _| Err(AppError::ExternalApi("503 Service Unavailable".to_string())));
        Arc::new(source)
    }

    fn aggregator(sources: Vec<Arc<dyn ContentSource>>) -> (CandidateAggregator, Arc<MemoryEmbeddingStore>) {
        let store = Arc::new(MemoryEmbeddingStore::new());
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(LengthEmbedder),
            store.clone(),
            Duration::from_secs(5),
        ));
        (
            CandidateAggregator::new(sources, embeddings, Duration::from_secs(5), 4),
            store,
        )
    }

    fn ids(pool: &CandidatePool) -> Vec<&str> {
        pool.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_keeps_first_occurrence_across_sources() {
        let (aggregator, _) = aggregator(vec![
            mock_source("a", vec![raw("1", "First"), raw("2", "Second")]),
            mock_source("b", vec![raw("2", "Duplicate"), raw("3", "Third")]),
        ]);

        let pool = aggregator.gather(&Preferences::default(), 10).await;
        assert_eq!(ids(&pool), vec!["1", "2", "3"]);
        assert_eq!(pool.items[1].title, "Second");
        assert!(pool.items.iter().all(|i| i.embedding.is_some()));
    }

    #[tokio::test]
    async fn test_single_source_outage_degrades() {
        let (aggregator, _) = aggregator(vec![
            failing_source("broken"),
            mock_source("ok", vec![raw("1", "Survivor")]),
        ]);

        let pool = aggregator.gather(&Preferences::default(), 10).await;
        assert_eq!(ids(&pool), vec!["1"]);
        assert_eq!(pool.failed_sources, vec!["broken"]);
    }

    #[tokio::test]
    async fn test_unembeddable_item_skipped() {
        let (aggregator, _) = aggregator(vec![mock_source(
            "a",
            vec![raw("1", "Fine"), raw("2", "unembeddable"), raw("3", "Also fine")],
        )]);

        let pool = aggregator.gather(&Preferences::default(), 10).await;
        assert_eq!(ids(&pool), vec!["1", "3"]);
        assert_eq!(pool.skipped_items, 1);
    }

    #[tokio::test]
    async fn test_embeddings_cached_by_item_id() {
        let (aggregator, store) = aggregator(vec![mock_source("a", vec![raw("1", "Cached title")])]);

        aggregator.gather(&Preferences::default(), 10).await;
        let entry = store.entry("1").await.unwrap();
        assert_eq!(entry.source_text, "Cached title");
    }

    #[tokio::test]
    async fn test_precomputed_embedding_kept() {
        let mut item = raw("1", "Shipped with vector");
        item.embedding = Some(vec![9.0, 9.0]);
        let (aggregator, store) = aggregator(vec![mock_source("a", vec![item])]);

        let pool = aggregator.gather(&Preferences::default(), 10).await;
        assert_eq!(pool.items[0].embedding, Some(vec![9.0, 9.0]));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_pool_truncated_to_size() {
        let items = (0..8).map(|i| raw(&i.to_string(), "Title")).collect();
        let (aggregator, _) = aggregator(vec![mock_source("a", items)]);

        let pool = aggregator.gather(&Preferences::default(), 3).await;
        assert_eq!(ids(&pool), vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_query_passed_to_sources() {
        let mut source = MockContentSource::new();
        source.expect_name().return_const("a");
        source
            .expect_fetch_candidates()
            .withf(|query, max| query.to_string() == "thriller tense" && *max == 10)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        let (aggregator, _) = aggregator(vec![Arc::new(source)]);

        let prefs = Preferences {
            genres: vec!["thriller".to_string()],
            mood: vec!["tense".to_string()],
            ..Default::default()
        };
        let pool = aggregator.gather(&prefs, 10).await;
        assert!(pool.items.is_empty());
    }

    struct StalledSource;

    #[async_trait::async_trait]
    impl ContentSource for StalledSource {
        async fn fetch_candidates(&self, _query: &str, _max_results: usize) -> AppResult<Vec<RawItem>> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(vec![raw("late", "Too late")])
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_timeout_degrades_to_no_results() {
        let (aggregator, _) = aggregator(vec![
            Arc::new(StalledSource),
            mock_source("ok", vec![raw("1", "On time")]),
        ]);

        let pool = aggregator.gather(&Preferences::default(), 10).await;
        assert_eq!(ids(&pool), vec!["1"]);
        assert_eq!(pool.failed_sources, vec!["stalled"]);
    }

    /// Records the highest number of simultaneous `embed` calls
    #[derive(Default)]
    struct TrackingEmbedder {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Embedder for TrackingEmbedder {
        async fn embed(&self, _text: &str) -> AppResult<Vec<f64>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0])
        }

        fn name(&self) -> &'static str {
            "tracking"
        }
    }

    #[tokio::test]
    async fn test_embedding_concurrency_is_capped() {
        let embedder = Arc::new(TrackingEmbedder::default());
        let embeddings = Arc::new(EmbeddingService::new(
            embedder.clone(),
            Arc::new(MemoryEmbeddingStore::new()),
            Duration::from_secs(5),
        ));
        let items = (0..10).map(|i| raw(&i.to_string(), "Clip")).collect();
        let aggregator = CandidateAggregator::new(
            vec![mock_source("a", items)],
            embeddings,
            Duration::from_secs(5),
            2,
        );

        let pool = aggregator.gather(&Preferences::default(), 10).await;
        assert_eq!(pool.items.len(), 10);

        let peak = embedder.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak in-flight embeddings was {}", peak);
        assert!(peak > 1, "embeddings never overlapped");
    }

    #[tokio::test]
    async fn test_no_sources_yields_empty_pool() {
        let (aggregator, _) = aggregator(vec![]);
        let pool = aggregator.gather(&Preferences::default(), 10).await;
        assert!(pool.items.is_empty());
        assert!(pool.failed_sources.is_empty());
    }
}
