use crate::authz::{require_role, AuthzError};
use crate::state::AppState;
use crate::web::middleware::{CurrentUser, MaybeUser};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use vakt_common::models::user::Role;
use vakt_db::ProfileChanges;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

fn authz_response(err: AuthzError) -> Response {
    let status = match err {
        AuthzError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AuthzError::Forbidden => StatusCode::FORBIDDEN,
    };
    (status, Json(json!({"error": err.to_string()}))).into_response()
}

/// GET /identity/me
#[tracing::instrument(skip(state))]
pub async fn my_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> impl IntoResponse {
    match state.identity.profile_by_username(&user.0.subject).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "User not found"})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to get user: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

/// PUT /identity/me
///
/// Accepts a partial profile. The password hash is not updatable through
/// this endpoint; a request carrying the field is rejected outright.
#[tracing::instrument(skip(state, body))]
pub async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    if body.get("password_hash").is_some() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "password_hash cannot be updated through this endpoint"})),
        )
            .into_response();
    }

    let req: UpdateProfileRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("Invalid request body: {}", e)})),
            )
                .into_response()
        }
    };

    let changes = ProfileChanges {
        email: req.email,
        address: req.address,
        phone: req.phone,
    };

    match state.identity.update_profile(&user.0.subject, changes).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "User not found"})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to update user profile: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

/// GET /identity/{id}
///
/// Admin-only lookup of an arbitrary user record by id. The caller's role
/// comes from their own user record, not from the token.
#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(principal): MaybeUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let granted = match &principal {
        Some(p) => match state.identity.role_of(&p.subject).await {
            Ok(role) => role,
            Err(e) => {
                tracing::error!("Failed to resolve caller role: {:#}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Internal server error"})),
                )
                    .into_response();
            }
        },
        None => None,
    };

    if let Err(e) = require_role(principal.as_ref(), granted, Role::Admin) {
        return authz_response(e);
    }

    match state.identity.profile_by_id(&id).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("User not found with id: {}", id)})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to get user: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

/// GET /identity/profile/{username}
#[tracing::instrument(skip(state))]
pub async fn public_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    if username.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "username must not be blank"})),
        )
            .into_response();
    }

    match state.identity.profile_by_username(&username).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("User not found: {}", username)})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to get user profile: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

/// POST /identity/tasks/deactivate-inactive
///
/// Callback for the internal scheduler, reachable only on the trusted
/// network. The payload is acknowledged and echoed back.
#[tracing::instrument(skip(payload))]
pub async fn deactivate_inactive(Json(payload): Json<serde_json::Value>) -> impl IntoResponse {
    tracing::info!("Received deactivate-inactive callback");
    Json(json!({"result": "ok", "received": payload}))
}
