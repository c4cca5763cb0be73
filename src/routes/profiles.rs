use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{error::AppResult, middleware::RequestId, models::Profile, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub user_id: String,
    pub name: String,
}

pub async fn save_profile(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(profile): Json<Profile>,
) -> AppResult<Json<Profile>> {
    tracing::debug!(request_id = %request_id, user_id = %profile.user_id, "Saving profile");
    let saved = state.profiles.save_profile(profile).await?;
    Ok(Json(saved))
}

pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Profile>>> {
    let profiles = state.profiles.list_profiles(&user_id).await?;
    Ok(Json(profiles))
}

/// Activates a saved profile; 404 if the user has no profile by that name
pub async fn activate_profile(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ActivateRequest>,
) -> AppResult<Json<Profile>> {
    tracing::debug!(request_id = %request_id, user_id = %request.user_id, name = %request.name, "Activating profile");
    let profile = state
        .profiles
        .activate(&request.user_id, &request.name)
        .await?;
    Ok(Json(profile))
}
