use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::Preferences,
    routes::{recommendations::anonymous, AppState},
    services::{playlist::DEFAULT_TARGET_MINUTES, Playlist},
};

const DEFAULT_PLAYLIST_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    #[serde(default = "anonymous")]
    pub user_id: String,
    pub preferences: Option<Preferences>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_target")]
    pub target_minutes: u32,
}

fn default_limit() -> i64 {
    DEFAULT_PLAYLIST_LIMIT
}

fn default_target() -> u32 {
    DEFAULT_TARGET_MINUTES
}

pub async fn build_playlist(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PlaylistRequest>,
) -> AppResult<Json<Playlist>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        target_minutes = request.target_minutes,
        "Playlist requested"
    );

    let preferences = state
        .profiles
        .resolve_preferences(&request.user_id, request.preferences)
        .await;

    let playlist = state
        .recommender
        .playlist(&preferences, &request.user_id, request.limit, request.target_minutes)
        .await?;
    Ok(Json(playlist))
}
