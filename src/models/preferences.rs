use serde::{Deserialize, Serialize};

/// Query phrase used when preferences carry no usable text
pub const DEFAULT_QUERY: &str = "popular general recommendations";

/// What the user is in the mood for
///
/// Deserializes from either a structured object or a bare free-text string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "PreferencesInput")]
pub struct Preferences {
    pub genres: Vec<String>,
    pub mood: Vec<String>,
    /// Allow-list of platforms. Empty means unrestricted.
    pub platforms: Vec<String>,
    pub max_duration_minutes: Option<u32>,
    pub language: Option<String>,
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PreferencesInput {
    Text(String),
    Structured(StructuredPreferences),
}

#[derive(Deserialize)]
struct StructuredPreferences {
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    mood: Vec<String>,
    #[serde(default)]
    platforms: Vec<String>,
    #[serde(default)]
    max_duration_minutes: Option<u32>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl From<PreferencesInput> for Preferences {
    fn from(input: PreferencesInput) -> Self {
        match input {
            PreferencesInput::Text(text) => Preferences::from_text(text),
            PreferencesInput::Structured(p) => Preferences {
                genres: p.genres,
                mood: p.mood,
                platforms: p.platforms,
                max_duration_minutes: p.max_duration_minutes,
                language: p.language,
                text: p.text,
            },
        }
    }
}

impl Preferences {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Embedding input derived from genres, mood and free text.
    ///
    /// Never empty: falls back to [`DEFAULT_QUERY`].
    pub fn query_text(&self) -> String {
        let query = self
            .genres
            .iter()
            .chain(self.mood.iter())
            .chain(self.text.iter())
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if query.is_empty() {
            DEFAULT_QUERY.to_string()
        } else {
            query
        }
    }

    /// Whether `platform` passes the allow-list (case-insensitive)
    pub fn allows_platform(&self, platform: &str) -> bool {
        self.platforms.is_empty()
            || self
                .platforms
                .iter()
                .any(|allowed| allowed.trim().eq_ignore_ascii_case(platform.trim()))
    }
}

/// Cache key for a preference query vector
pub fn preference_cache_key(query: &str) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("pref:{}", normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_text_combines_genres_and_mood() {
        let prefs = Preferences {
            genres: vec!["sci-fi".to_string(), " drama ".to_string()],
            mood: vec!["thoughtful".to_string()],
            ..Default::default()
        };
        assert_eq!(prefs.query_text(), "sci-fi drama thoughtful");
    }

    #[test]
    fn test_query_text_falls_back_to_default_phrase() {
        assert_eq!(Preferences::default().query_text(), DEFAULT_QUERY);

        let blank = Preferences {
            genres: vec!["   ".to_string()],
            text: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.query_text(), DEFAULT_QUERY);
    }

    #[test]
    fn test_deserialize_free_text() {
        let prefs: Preferences = serde_json::from_str(r#""cozy mystery for a rainy night""#).unwrap();
        assert_eq!(prefs.text.as_deref(), Some("cozy mystery for a rainy night"));
        assert!(prefs.genres.is_empty());
    }

    #[test]
    fn test_deserialize_structured() {
        let prefs: Preferences = serde_json::from_str(
            r#"{"genres": ["horror"], "platforms": ["youtube"], "max_duration_minutes": 30}"#,
        )
        .unwrap();
        assert_eq!(prefs.genres, vec!["horror".to_string()]);
        assert_eq!(prefs.max_duration_minutes, Some(30));
        assert!(prefs.mood.is_empty());
    }

    #[test]
    fn test_allows_platform() {
        let open = Preferences::default();
        assert!(open.allows_platform("anything"));

        let restricted = Preferences {
            platforms: vec!["YouTube".to_string()],
            ..Default::default()
        };
        assert!(restricted.allows_platform("youtube"));
        assert!(!restricted.allows_platform("tmdb"));
    }

    #[test]
    fn test_preference_cache_key_normalizes() {
        assert_eq!(
            preference_cache_key("  Sci-Fi   Thoughtful "),
            preference_cache_key("sci-fi thoughtful")
        );
        assert_eq!(preference_cache_key("Sci-Fi"), "pref:sci-fi");
    }
}
