mod content;
mod feedback;
mod preferences;

pub use content::{ContentItem, RawItem, Recommendation};
pub use feedback::{FeedbackRecord, Profile};
pub use preferences::{preference_cache_key, Preferences, DEFAULT_QUERY};
