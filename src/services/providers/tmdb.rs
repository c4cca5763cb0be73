/// TMDB movie search
///
/// API Flow: `/search/movie?query=...` returns id, title, overview and a
/// popularity figure. Runtimes are not part of search results, so durations
/// stay unknown.
use crate::{
    error::{AppError, AppResult},
    models::RawItem,
    services::providers::ContentSource,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Map, Value};

const PLATFORM: &str = "tmdb";

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    /// TV results carry `name` instead of `title`
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    popularity: Option<f64>,
    #[serde(default)]
    release_date: Option<String>,
}

impl From<TmdbMovie> for RawItem {
    fn from(movie: TmdbMovie) -> Self {
        let mut metadata = Map::new();
        metadata.insert(
            "popularity".to_string(),
            movie.popularity.map(Value::from).unwrap_or(Value::Null),
        );
        metadata.insert(
            "release_date".to_string(),
            movie.release_date.map(Value::from).unwrap_or(Value::Null),
        );

        RawItem {
            id: Some(format!("tmdb-{}", movie.id)),
            title: movie.title.or(movie.name),
            description: movie.overview,
            platform: PLATFORM.to_string(),
            url: None,
            duration_minutes: None,
            metadata,
            embedding: None,
        }
    }
}

#[derive(Clone)]
pub struct TmdbSource {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbSource {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for TmdbSource {
    async fn fetch_candidates(&self, query: &str, max_results: usize) -> AppResult<Vec<RawItem>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/search/movie", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("page", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        let items: Vec<RawItem> = search
            .results
            .into_iter()
            .take(max_results)
            .map(RawItem::from)
            .collect();

        tracing::info!(
            query = %query,
            results = items.len(),
            source = PLATFORM,
            "Catalog search completed"
        );

        Ok(items)
    }

    fn name(&self) -> &'static str {
        PLATFORM
    }
}
