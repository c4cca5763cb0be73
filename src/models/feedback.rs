use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Preferences;

/// A like or dislike a user gave to an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub user_id: String,
    pub item_id: String,
    pub liked: bool,
    /// Captured at feedback time from the item's text. Only ever set on likes.
    #[serde(default)]
    pub embedding: Option<Vec<f64>>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, liked: bool) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            liked,
            embedding: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches an embedding; ignored for dislikes
    pub fn with_embedding(mut self, embedding: Option<Vec<f64>>) -> Self {
        if self.liked {
            self.embedding = embedding;
        }
        self
    }
}

/// A named preference preset belonging to a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub preferences: Preferences,
}
