use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use media_recommender::{
    config::Config,
    db::{
        create_pool, create_redis_client, CacheWriterHandle, EmbeddingStore, FeedbackStore,
        MemoryEmbeddingStore, MemoryFeedbackStore, MemoryProfileStore, PgFeedbackStore,
        PgProfileStore, ProfileStore, RedisEmbeddingStore, SessionStore,
    },
    routes::{create_router, AppState},
    services::{
        providers::{ContentSource, TmdbSource, YoutubeSource},
        CandidateAggregator, EmbeddingService, FeedbackService, HybridScorer, OpenAiEmbedder,
        ProfileService, RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("media_recommender=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Per-call budgets are enforced with tokio timeouts; this is a backstop
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;

    let (embedding_store, cache_writer): (Arc<dyn EmbeddingStore>, Option<CacheWriterHandle>) =
        match &config.redis_url {
            Some(url) => {
                let (store, handle) = RedisEmbeddingStore::new(create_redis_client(url)?);
                (Arc::new(store), Some(handle))
            }
            None => (Arc::new(MemoryEmbeddingStore::new()), None),
        };

    let (feedback_store, profile_store): (Arc<dyn FeedbackStore>, Arc<dyn ProfileStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                (
                    Arc::new(PgFeedbackStore::new(pool.clone())),
                    Arc::new(PgProfileStore::new(pool)),
                )
            }
            None => (
                Arc::new(MemoryFeedbackStore::new()),
                Arc::new(MemoryProfileStore::new()),
            ),
        };

    let embedder = OpenAiEmbedder::new(
        http_client.clone(),
        config.openai_api_key.clone(),
        config.embedding_api_url.clone(),
        config.embedding_model.clone(),
    );
    let embeddings = Arc::new(EmbeddingService::new(
        Arc::new(embedder),
        embedding_store.clone(),
        config.embed_timeout(),
    ));

    let mut sources: Vec<Arc<dyn ContentSource>> = Vec::new();
    if let Some(key) = &config.tmdb_api_key {
        sources.push(Arc::new(TmdbSource::new(
            http_client.clone(),
            key.clone(),
            config.tmdb_api_url.clone(),
        )));
    }
    if let Some(key) = &config.youtube_api_key {
        sources.push(Arc::new(YoutubeSource::new(
            http_client.clone(),
            key.clone(),
            config.youtube_api_url.clone(),
        )));
    }
    if sources.is_empty() {
        tracing::warn!("No content source configured; recommendations will be empty");
    }

    let aggregator = CandidateAggregator::new(
        sources,
        embeddings.clone(),
        config.source_timeout(),
        config.embed_concurrency,
    );
    tracing::info!(
        sources = ?aggregator.source_names(),
        embedding_store = embedding_store.name(),
        persistent = config.database_url.is_some(),
        "Recommender configured"
    );

    let sessions = Arc::new(SessionStore::new());
    let state = Arc::new(AppState {
        recommender: RecommendationService::new(
            aggregator,
            HybridScorer::new(embeddings.clone()),
            feedback_store.clone(),
            sessions.clone(),
            config.pool_multiplier,
        ),
        feedback: FeedbackService::new(feedback_store, sessions.clone(), embeddings),
        profiles: ProfileService::new(profile_store, sessions),
    });

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
