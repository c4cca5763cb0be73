use std::sync::Arc;

use crate::{
    db::{ProfileStore, SessionStore},
    error::{AppError, AppResult},
    models::{Preferences, Profile},
};

/// Named preference presets and which one is active per user
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    sessions: Arc<SessionStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, sessions: Arc<SessionStore>) -> Self {
        Self { store, sessions }
    }

    pub async fn save_profile(&self, profile: Profile) -> AppResult<Profile> {
        if profile.user_id.trim().is_empty() || profile.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "user_id and name are required".to_string(),
            ));
        }
        self.store.save(&profile).await?;
        tracing::info!(user_id = %profile.user_id, name = %profile.name, "Profile saved");
        Ok(profile)
    }

    pub async fn list_profiles(&self, user_id: &str) -> AppResult<Vec<Profile>> {
        self.store.list(user_id).await
    }

    /// Makes `name` the user's active profile
    pub async fn activate(&self, user_id: &str, name: &str) -> AppResult<Profile> {
        let profile = self
            .store
            .get(user_id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile '{}' not found", name)))?;

        self.sessions.set_active_profile(user_id, profile.clone()).await;
        tracing::info!(user_id = %user_id, name = %name, "Profile activated");
        Ok(profile)
    }

    /// Explicit preferences win; otherwise the active profile; otherwise empty
    pub async fn resolve_preferences(
        &self,
        user_id: &str,
        explicit: Option<Preferences>,
    ) -> Preferences {
        match explicit {
            Some(preferences) => preferences,
            None => self
                .sessions
                .get(user_id)
                .await
                .active_profile
                .map(|profile| profile.preferences)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryProfileStore;

    fn service() -> ProfileService {
        ProfileService::new(
            Arc::new(MemoryProfileStore::new()),
            Arc::new(SessionStore::new()),
        )
    }

    fn profile(name: &str, text: &str) -> Profile {
        Profile {
            user_id: "u1".to_string(),
            name: name.to_string(),
            preferences: Preferences::from_text(text),
        }
    }

    #[tokio::test]
    async fn test_activate_missing_profile_is_not_found() {
        let service = service();
        let result = service.activate("u1", "ghost").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_active_profile_used_when_no_explicit_preferences() {
        let service = service();
        service.save_profile(profile("night", "noir")).await.unwrap();
        service.activate("u1", "night").await.unwrap();

        let resolved = service.resolve_preferences("u1", None).await;
        assert_eq!(resolved.text.as_deref(), Some("noir"));

        let explicit = service
            .resolve_preferences("u1", Some(Preferences::from_text("musicals")))
            .await;
        assert_eq!(explicit.text.as_deref(), Some("musicals"));
    }

    #[tokio::test]
    async fn test_no_profile_resolves_to_default() {
        let service = service();
        assert_eq!(service.resolve_preferences("u2", None).await, Preferences::default());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let service = service();
        let result = service.save_profile(profile(" ", "x")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
