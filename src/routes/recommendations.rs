use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::Preferences,
    routes::AppState,
    services::{scorer::DEFAULT_LIMIT, RecommendationOutcome},
};

pub const ANONYMOUS_USER: &str = "anon";

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default = "anonymous")]
    pub user_id: String,
    /// Free text or structured preferences; the active profile is used when absent
    pub preferences: Option<Preferences>,
    pub limit: Option<i64>,
}

pub(crate) fn anonymous() -> String {
    ANONYMOUS_USER.to_string()
}

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationOutcome>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        limit = ?request.limit,
        "Recommendation requested"
    );

    let preferences = state
        .profiles
        .resolve_preferences(&request.user_id, request.preferences)
        .await;
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT as i64);

    let outcome = state
        .recommender
        .recommend(&preferences, &request.user_id, limit)
        .await?;
    Ok(Json(outcome))
}
