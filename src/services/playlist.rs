use serde::Serialize;

use crate::models::ContentItem;

pub const DEFAULT_TARGET_MINUTES: u32 = 90;

/// Greedy, order-preserving fill up to `target_minutes`.
///
/// Walks the ranked items once: an item is taken if it still fits, skipped if
/// it would overflow, and the walk stops once the target is reached. Items of
/// unknown duration are always taken and do not count toward the total. This
/// is intentionally not an optimal packing.
pub fn pack_playlist(ranked_items: &[ContentItem], target_minutes: u32) -> Vec<ContentItem> {
    let mut playlist = Vec::new();
    let mut total: u32 = 0;

    for item in ranked_items {
        if let Some(minutes) = item.duration_minutes {
            if total.saturating_add(minutes) > target_minutes {
                continue;
            }
            total += minutes;
        }
        playlist.push(item.clone());

        if total >= target_minutes {
            break;
        }
    }

    playlist
}

/// Sum of known durations
pub fn total_minutes(items: &[ContentItem]) -> u32 {
    items.iter().filter_map(|item| item.duration_minutes).sum()
}

/// Playlist entry as returned to clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaylistEntry {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub duration_minutes: Option<u32>,
}

impl From<ContentItem> for PlaylistEntry {
    fn from(item: ContentItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            url: item.url,
            duration_minutes: item.duration_minutes,
        }
    }
}
