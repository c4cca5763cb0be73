use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{ContentItem, Profile};

/// Per-user conversational state
#[derive(Debug, Clone)]
pub struct Session {
    /// Items returned by the user's most recent recommendation request
    pub last_items: Vec<ContentItem>,
    pub active_profile: Option<Profile>,
    pub last_update: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            last_items: Vec::new(),
            active_profile: None,
            last_update: Utc::now(),
        }
    }
}

/// In-memory session store keyed by user id
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: &str) -> Session {
        self.sessions
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set_last_items(&self, user_id: &str, items: Vec<ContentItem>) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id.to_string()).or_default();
        session.last_items = items;
        session.last_update = Utc::now();
    }

    pub async fn set_active_profile(&self, user_id: &str, profile: Profile) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id.to_string()).or_default();
        session.active_profile = Some(profile);
        session.last_update = Utc::now();
    }

    /// Looks up an item from the user's last recommendations
    pub async fn find_recent_item(&self, user_id: &str, item_id: &str) -> Option<ContentItem> {
        self.sessions
            .read()
            .await
            .get(user_id)
            .and_then(|s| s.last_items.iter().find(|item| item.id == item_id))
            .cloned()
    }

    pub async fn clear(&self, user_id: &str) {
        self.sessions.write().await.remove(user_id);
    }
}
