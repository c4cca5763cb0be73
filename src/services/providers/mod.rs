/// External content catalogs
///
/// Each catalog (TMDB, YouTube, ...) implements `ContentSource` and returns raw
/// items for a free-text query. The aggregator normalizes, de-duplicates and
/// embeds them; a failing source only shrinks the candidate pool.
use crate::{error::AppResult, models::RawItem};

pub mod tmdb;
pub mod youtube;

pub use tmdb::TmdbSource;
pub use youtube::YoutubeSource;

/// Trait for content catalogs
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Search the catalog, returning at most `max_results` raw items
    async fn fetch_candidates(&self, query: &str, max_results: usize) -> AppResult<Vec<RawItem>>;

    /// Source name for logging and degradation warnings
    fn name(&self) -> &'static str;
}
