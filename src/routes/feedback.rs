use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{error::AppResult, middleware::RequestId, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub item_id: String,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
    /// Whether an embedding was captured for personalization
    pub embedded: bool,
}

/// Handler for like/dislike submissions
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    tracing::debug!(request_id = %request_id, item_id = %request.item_id, "Feedback received");

    let record = state
        .feedback
        .record_feedback(&request.user_id, &request.item_id, request.liked)
        .await?;

    Ok(Json(FeedbackResponse {
        status: "ok",
        embedded: record.embedding.is_some(),
    }))
}
