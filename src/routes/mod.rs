use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{FeedbackService, ProfileService, RecommendationService},
};

pub mod feedback;
pub mod playlist;
pub mod profiles;
pub mod recommendations;

/// Services shared by all handlers
pub struct AppState {
    pub recommender: RecommendationService,
    pub feedback: FeedbackService,
    pub profiles: ProfileService,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/playlist", post(playlist::build_playlist))
        .route("/feedback", post(feedback::submit_feedback))
        .route("/profiles", post(profiles::save_profile))
        .route("/profiles/activate", post(profiles::activate_profile))
        .route("/profiles/:user_id", get(profiles::list_profiles))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
