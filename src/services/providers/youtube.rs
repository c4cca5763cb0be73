/// YouTube Data API video search
///
/// API Flow:
/// 1. `/search?type=video` returns video ids for the query
/// 2. `/videos?part=snippet,contentDetails` returns titles and ISO-8601 durations
use crate::{
    error::{AppError, AppResult},
    models::RawItem,
    services::providers::ContentSource,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Map, Value};

const PLATFORM: &str = "youtube";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<SearchItemId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    id: String,
    #[serde(default)]
    snippet: Option<Snippet>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

/// Minutes from an ISO-8601 duration such as `PT1H2M30S`.
///
/// Hours and minutes count; seconds are dropped. `None` when nothing parses
/// or the total overflows.
pub fn parse_duration_minutes(duration: &str) -> Option<u32> {
    let rest = duration.strip_prefix("PT")?;
    let mut minutes: Option<u32> = None;
    let mut number = String::new();

    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let value: u32 = number.parse().ok()?;
        number.clear();
        match c {
            'H' => minutes = Some(minutes.unwrap_or(0).checked_add(value.checked_mul(60)?)?),
            'M' => minutes = Some(minutes.unwrap_or(0).checked_add(value)?),
            'S' => {}
            _ => return None,
        }
    }

    if !number.is_empty() {
        return None;
    }
    minutes
}

impl From<Video> for RawItem {
    fn from(video: Video) -> Self {
        let snippet = video.snippet.unwrap_or(Snippet {
            title: None,
            description: None,
            channel_title: None,
        });

        let mut metadata = Map::new();
        metadata.insert(
            "channelTitle".to_string(),
            snippet.channel_title.map(Value::from).unwrap_or(Value::Null),
        );

        let duration_minutes = video
            .content_details
            .and_then(|details| details.duration)
            .and_then(|d| parse_duration_minutes(&d));

        RawItem {
            url: Some(format!("https://www.youtube.com/watch?v={}", video.id)),
            id: Some(video.id),
            title: snippet.title,
            description: snippet.description,
            platform: PLATFORM.to_string(),
            duration_minutes,
            metadata,
            embedding: None,
        }
    }
}

/// Largest `maxResults` the search endpoint accepts
pub const MAX_SEARCH_RESULTS: usize = 50;

fn search_page_size(max_results: usize) -> usize {
    max_results.min(MAX_SEARCH_RESULTS)
}

#[derive(Clone)]
pub struct YoutubeSource {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl YoutubeSource {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "YouTube API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl ContentSource for YoutubeSource {
    async fn fetch_candidates(&self, query: &str, max_results: usize) -> AppResult<Vec<RawItem>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        if max_results > MAX_SEARCH_RESULTS {
            tracing::debug!(requested = max_results, cap = MAX_SEARCH_RESULTS, "Capping YouTube search size");
        }
        let max_results = search_page_size(max_results).to_string();
        let search: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        let video_ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.and_then(|id| id.video_id))
            .collect();

        if video_ids.is_empty() {
            return Ok(vec![]);
        }

        let ids = video_ids.join(",");
        let videos: VideosResponse = self
            .get_json(
                "videos",
                &[("part", "snippet,contentDetails"), ("id", ids.as_str())],
            )
            .await?;

        let items: Vec<RawItem> = videos.items.into_iter().map(RawItem::from).collect();

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_hours_and_minutes() {
        assert_eq!(parse_duration_minutes("PT1H2M30S"), Some(62));
        assert_eq!(parse_duration_minutes("PT2H"), Some(120));
        assert_eq!(parse_duration_minutes("PT15M"), Some(15));
    }

    #[test]
    fn test_parse_duration_seconds_only_is_unknown() {
        assert_eq!(parse_duration_minutes("PT45S"), None);
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration_minutes(""), None);
        assert_eq!(parse_duration_minutes("P1D"), None);
        assert_eq!(parse_duration_minutes("PTxM"), None);
        assert_eq!(parse_duration_minutes("PT12"), None);
    }

    #[test]
    fn test_parse_duration_overflow_is_unknown() {
        assert_eq!(parse_duration_minutes("PT99999999H"), None);
        assert_eq!(parse_duration_minutes("PT71582788H5000M"), None);
        assert_eq!(parse_duration_minutes("PT4294967296M"), None);
    }

    #[test]
    fn test_search_page_size_is_capped() {
        assert_eq!(search_page_size(100), MAX_SEARCH_RESULTS);
        assert_eq!(search_page_size(50), 50);
        assert_eq!(search_page_size(7), 7);
    }

    #[test]
    fn test_search_response_skips_non_videos() {
        let json = r#"{
            "items": [
                {"id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"}},
                {"id": {"kind": "youtube#channel", "channelId": "UC123"}}
            ]
        }"#;

        let search: SearchResponse = serde_json::from_str(json).unwrap();
        let ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.and_then(|id| id.video_id))
            .collect();
        assert_eq!(ids, vec!["dQw4w9WgXcQ".to_string()]);
    }

    #[test]
    fn test_video_to_raw_item() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "snippet": {"title": "Synthwave mix", "description": "Night drive", "channelTitle": "Retro"},
            "contentDetails": {"duration": "PT1H5M"}
        }"#;

        let video: Video = serde_json::from_str(json).unwrap();
        let raw = RawItem::from(video);
        assert_eq!(raw.id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(raw.url.as_deref(), Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert_eq!(raw.duration_minutes, Some(65));
        assert_eq!(raw.metadata["channelTitle"], "Retro");
        assert_eq!(raw.platform, "youtube");
    }
}
