use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// API key for the embeddings provider
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible embeddings API
    #[serde(default = "default_embedding_api_url")]
    pub embedding_api_url: String,

    /// Embedding model name; every cached vector must come from the same model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// TMDB API key. The TMDB source is disabled when absent.
    pub tmdb_api_key: Option<String>,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// YouTube Data API key. The YouTube source is disabled when absent.
    pub youtube_api_key: Option<String>,

    #[serde(default = "default_youtube_api_url")]
    pub youtube_api_url: String,

    /// PostgreSQL connection URL for feedback and profiles (in-memory when absent)
    pub database_url: Option<String>,

    /// Redis connection URL for the embedding cache (in-memory when absent)
    pub redis_url: Option<String>,

    /// Timeout for a single content source call
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,

    /// Timeout for a single embedding call
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    /// Maximum number of in-flight embedding calls per request
    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,

    /// Candidate pool size as a multiple of the requested limit
    #[serde(default = "default_pool_multiplier")]
    pub pool_multiplier: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_embedding_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_youtube_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_source_timeout_secs() -> u64 {
    15
}

fn default_embed_timeout_secs() -> u64 {
    20
}

fn default_embed_concurrency() -> usize {
    8
}

fn default_pool_multiplier() -> usize {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.embed_concurrency == 0 {
            anyhow::bail!("EMBED_CONCURRENCY must be at least 1");
        }
        if self.pool_multiplier == 0 {
            anyhow::bail!("POOL_MULTIPLIER must be at least 1");
        }
        Ok(())
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
