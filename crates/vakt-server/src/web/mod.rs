pub mod auth;
pub mod middleware;
pub mod users;

use crate::state::AppState;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::{routing::get, routing::post, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// GET /health -- liveness probe, always public
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/identity", identity_routes(state.clone()))
        .layer(from_fn_with_state(state, middleware::bind_identity))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn identity_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Token issuance group (public prefix)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Profile of the authenticated caller
        .route("/me", get(users::my_profile).put(users::update_my_profile))
        // Public profile lookup
        .route("/profile/{username}", get(users::public_profile))
        // Scheduler callback (trusted network)
        .route("/tasks/deactivate-inactive", post(users::deactivate_inactive))
        // Admin lookup by id
        .route("/{id}", get(users::get_user))
        .with_state(state)
}
