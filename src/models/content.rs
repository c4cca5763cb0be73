use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A recommendable movie or video, normalized from a content source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    /// Stable identifier, unique within one candidate pool
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Source tag, e.g. "youtube" or "tmdb"
    pub platform: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Runtime in minutes; `None` means unknown
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Populated lazily from the embedding cache; never serialized to clients
    #[serde(skip)]
    pub embedding: Option<Vec<f64>>,
}

impl ContentItem {
    /// Popularity from metadata; 0 when absent or non-numeric
    pub fn popularity(&self) -> f64 {
        self.metadata
            .get("popularity")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Text the item embedding is computed from
    pub fn embedding_text(&self) -> String {
        let description = self.description.as_deref().unwrap_or("");
        format!("{} {}", self.title, description).trim().to_string()
    }

    /// Whether the item is known to run longer than `max_minutes`
    pub fn exceeds_duration(&self, max_minutes: u32) -> bool {
        self.duration_minutes
            .map(|minutes| minutes > max_minutes)
            .unwrap_or(false)
    }
}

/// Raw item as emitted by a content source, before normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawItem {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub platform: String,
    pub url: Option<String>,
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Some catalogs ship precomputed vectors
    #[serde(default)]
    pub embedding: Option<Vec<f64>>,
}

impl RawItem {
    /// Normalizes into a `ContentItem`. Items without an id or title are unusable.
    pub fn into_content_item(self) -> Option<ContentItem> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let title = self.title.filter(|title| !title.trim().is_empty())?;

        Some(ContentItem {
            id,
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            platform: self.platform,
            url: self.url,
            duration_minutes: self.duration_minutes,
            metadata: self.metadata,
            embedding: self.embedding.filter(|v| !v.is_empty()),
        })
    }
}

/// One ranked result
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub item: ContentItem,
    /// Not bounded to [0, 1]; rule adjustments and popularity can push it out
    pub score: f64,
    pub reason: String,
}
