use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vakt_common::models::auth::Principal;

use crate::auth::verify_token;
use crate::state::AppState;

/// Middleware that binds a verified `Principal` to the request extensions.
///
/// Requests on a configured public path prefix are passed through untouched.
/// For everything else the bearer token is verified if one is presented, but
/// a missing or invalid token never aborts the request here: the request
/// simply proceeds without a principal and handlers that need one reject it
/// through the authorization gate. Binding happens at most once per request;
/// an already-bound principal is left in place.
pub async fn bind_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state
        .config
        .auth
        .public_paths
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
    {
        return next.run(request).await;
    }

    if request.extensions().get::<Principal>().is_some() {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        match verify_token(token, &state.signing_key) {
            Ok(principal) => {
                request.extensions_mut().insert(principal);
            }
            Err(e) => {
                tracing::warn!(path = %path, "Ignoring invalid bearer token: {}", e);
            }
        }
    }

    next.run(request).await
}

/// Extractor for handlers that require an authenticated caller.
/// Rejects with 401 when no principal was bound to the request.
#[derive(Debug)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(principal) => Ok(CurrentUser(principal.clone())),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "authentication required"})),
            )
                .into_response()),
        }
    }
}

/// Extractor for handlers that consult the principal without requiring one.
#[derive(Debug)]
pub struct MaybeUser(pub Option<Principal>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Principal>().cloned()))
    }
}
