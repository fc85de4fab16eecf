use anyhow::Result;
use axum::body::Body;
use axum::Router;
use chrono::Utc;
use http::Request;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vakt_common::models::auth::{Claims, Principal};
use vakt_db::{MemoryUserStore, NewUser, UserStore};
use vakt_server::auth::{hash_password, issue_token, SigningKey};
use vakt_server::config::{AuthConfig, DbConfig, ServerConfig};
use vakt_server::identity::IdentityService;
use vakt_server::state::AppState;
use vakt_server::web::build_router;

// ─── Test helpers ───────────────────────────────────────────────────────

const TEST_SECRET: &[u8] = b"integration-test-secret";

fn test_key() -> SigningKey {
    SigningKey::from_secret(TEST_SECRET)
}

/// Seeded records: "alice" (id "42", USER), "bob" (id "bob-id", USER) and
/// "admin" (id "admin-id", ADMIN).
async fn setup() -> Result<Router> {
    let store = Arc::new(MemoryUserStore::new());
    store
        .create(NewUser {
            id: "42".to_string(),
            username: "alice".to_string(),
            password_hash: hash_password("wonderland").unwrap(),
            email: Some("alice@example.com".to_string()),
            address: None,
            phone: None,
            role: "USER".to_string(),
        })
        .await?;
    store
        .create(NewUser {
            id: "bob-id".to_string(),
            username: "bob".to_string(),
            password_hash: hash_password("hunter2").unwrap(),
            email: Some("bob@example.com".to_string()),
            address: Some("12 Elm St".to_string()),
            phone: None,
            role: "USER".to_string(),
        })
        .await?;
    store
        .create(NewUser {
            id: "admin-id".to_string(),
            username: "admin".to_string(),
            password_hash: hash_password("sup3rvisor").unwrap(),
            email: Some("admin@example.com".to_string()),
            address: None,
            phone: None,
            role: "ADMIN".to_string(),
        })
        .await?;

    let config = ServerConfig {
        listen: "127.0.0.1:0".to_string(),
        grpc_listen: "127.0.0.1:0".to_string(),
        db: DbConfig {
            url: "postgres://unused".to_string(),
        },
        auth: AuthConfig::default(),
    };

    let identity = IdentityService::new(store);
    let state = AppState::new(identity, test_key(), config);
    Ok(build_router(state))
}

fn token_for(username: &str) -> String {
    issue_token(username, &test_key()).unwrap()
}

/// A token whose signature checks out against the test key but whose
/// validity window closed an hour ago.
fn expired_token(username: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap()
}

fn api_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn api_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn authed_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ─── Test 1: Health endpoint is public ──────────────────────────────────

#[tokio::test]
async fn test_health_is_public() -> Result<()> {
    let router = setup().await?;

    let response = router.oneshot(api_get("/health")).await?;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");

    Ok(())
}

// ─── Test 2: Register, login, fetch own profile ─────────────────────────

#[tokio::test]
async fn test_register_login_me_round_trip() -> Result<()> {
    let router = setup().await?;

    let response = router
        .clone()
        .oneshot(api_request(
            "POST",
            "/identity/auth/register",
            json!({"username": "carol", "password": "s3cret", "email": "carol@example.com"}),
        ))
        .await?;
    assert_eq!(response.status(), 201);
    let profile = body_json(response).await;
    assert_eq!(profile["username"], "carol");
    assert_eq!(profile["role"], "USER");
    assert!(profile.get("password_hash").is_none());
    let user_id = profile["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(api_request(
            "POST",
            "/identity/auth/login",
            json!({"username": "carol", "password": "s3cret"}),
        ))
        .await?;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["user_id"], user_id.as_str());
    assert_eq!(body["username"], "carol");
    let token = body["token"].as_str().unwrap().to_string();

    let response = router.oneshot(authed_get("/identity/me", &token)).await?;
    assert_eq!(response.status(), 200);
    let me = body_json(response).await;
    assert_eq!(me["username"], "carol");
    assert_eq!(me["email"], "carol@example.com");
    assert!(me.get("password_hash").is_none());

    Ok(())
}

// ─── Test 3: Register validation ────────────────────────────────────────

#[tokio::test]
async fn test_register_rejects_blank_credentials() -> Result<()> {
    let router = setup().await?;

    let response = router
        .clone()
        .oneshot(api_request(
            "POST",
            "/identity/auth/register",
            json!({"username": "   ", "password": "pw"}),
        ))
        .await?;
    assert_eq!(response.status(), 400);

    let response = router
        .oneshot(api_request(
            "POST",
            "/identity/auth/register",
            json!({"username": "dave", "password": ""}),
        ))
        .await?;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_taken_username() -> Result<()> {
    let router = setup().await?;

    let response = router
        .oneshot(api_request(
            "POST",
            "/identity/auth/register",
            json!({"username": "bob", "password": "whatever"}),
        ))
        .await?;
    assert_eq!(response.status(), 409);

    Ok(())
}

// ─── Test 4: Login failures look the same to the client ─────────────────

#[tokio::test]
async fn test_login_failures_are_uniform() -> Result<()> {
    let router = setup().await?;

    let response = router
        .clone()
        .oneshot(api_request(
            "POST",
            "/identity/auth/login",
            json!({"username": "nobody", "password": "hunter2"}),
        ))
        .await?;
    assert_eq!(response.status(), 401);
    let unknown_user = body_json(response).await;

    let response = router
        .oneshot(api_request(
            "POST",
            "/identity/auth/login",
            json!({"username": "bob", "password": "wrong"}),
        ))
        .await?;
    assert_eq!(response.status(), 401);
    let wrong_password = body_json(response).await;

    // Unknown user and bad password are indistinguishable from outside
    assert_eq!(unknown_user, wrong_password);
    assert_eq!(unknown_user["error"], "Invalid username or password");

    Ok(())
}

// ─── Test 5: /identity/me requires a bound principal ────────────────────

#[tokio::test]
async fn test_me_requires_principal() -> Result<()> {
    let router = setup().await?;

    let response = router.oneshot(api_get("/identity/me")).await?;
    assert_eq!(response.status(), 401);
    let body = body_json(response).await;
    assert_eq!(body["error"], "authentication required");

    Ok(())
}

// ─── Test 6: Invalid tokens fall through to an unauthenticated request ──

#[tokio::test]
async fn test_me_with_invalid_tokens() -> Result<()> {
    let router = setup().await?;

    // Garbage that does not even parse as a token
    let response = router
        .clone()
        .oneshot(authed_get("/identity/me", "not-a-token"))
        .await?;
    assert_eq!(response.status(), 401);
    let body = body_json(response).await;
    assert_eq!(body["error"], "authentication required");

    // Structurally valid token signed with a different key
    let foreign = issue_token("bob", &SigningKey::from_secret(b"some-other-key")).unwrap();
    let response = router
        .clone()
        .oneshot(authed_get("/identity/me", &foreign))
        .await?;
    assert_eq!(response.status(), 401);

    // Correctly signed token whose expiry has passed
    let response = router
        .oneshot(authed_get("/identity/me", &expired_token("bob")))
        .await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

// ─── Test 7: Admin-only lookup by id ────────────────────────────────────

#[tokio::test]
async fn test_user_lookup_requires_admin_role() -> Result<()> {
    let router = setup().await?;

    // No principal bound
    let response = router.clone().oneshot(api_get("/identity/42")).await?;
    assert_eq!(response.status(), 401);
    let body = body_json(response).await;
    assert_eq!(body["error"], "authentication required");

    // Authenticated, but only a plain user
    let response = router
        .clone()
        .oneshot(authed_get("/identity/42", &token_for("bob")))
        .await?;
    assert_eq!(response.status(), 403);
    let body = body_json(response).await;
    assert_eq!(body["error"], "insufficient role");

    // Admin succeeds
    let response = router
        .oneshot(authed_get("/identity/42", &token_for("admin")))
        .await?;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["id"], "42");
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());

    Ok(())
}

#[tokio::test]
async fn test_user_lookup_unknown_id() -> Result<()> {
    let router = setup().await?;

    let response = router
        .oneshot(authed_get("/identity/no-such-id", &token_for("admin")))
        .await?;
    assert_eq!(response.status(), 404);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("no-such-id"));

    Ok(())
}

// ─── Test 8: Public profile lookup ──────────────────────────────────────

#[tokio::test]
async fn test_public_profile_lookup() -> Result<()> {
    let router = setup().await?;

    // No token needed
    let response = router
        .clone()
        .oneshot(api_get("/identity/profile/alice"))
        .await?;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());

    // Unknown username is a 404 naming the username, never a 500
    let response = router
        .clone()
        .oneshot(api_get("/identity/profile/ghost"))
        .await?;
    assert_eq!(response.status(), 404);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("ghost"));

    // Blank username is rejected outright
    let response = router.oneshot(api_get("/identity/profile/%20")).await?;
    assert_eq!(response.status(), 400);

    Ok(())
}

// ─── Test 9: Partial profile update ─────────────────────────────────────

#[tokio::test]
async fn test_update_my_profile() -> Result<()> {
    let router = setup().await?;
    let token = token_for("bob");

    let response = router
        .clone()
        .oneshot(authed_request(
            "PUT",
            "/identity/me",
            &token,
            json!({"email": "bob@new.example.com", "phone": "555-0100"}),
        ))
        .await?;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["email"], "bob@new.example.com");
    assert_eq!(body["phone"], "555-0100");
    // Fields left out of the body keep their stored values
    assert_eq!(body["address"], "12 Elm St");

    let response = router.oneshot(authed_get("/identity/me", &token)).await?;
    let body = body_json(response).await;
    assert_eq!(body["email"], "bob@new.example.com");

    Ok(())
}

#[tokio::test]
async fn test_update_rejects_password_hash_field() -> Result<()> {
    let router = setup().await?;

    let response = router
        .oneshot(authed_request(
            "PUT",
            "/identity/me",
            &token_for("bob"),
            json!({"email": "bob@new.example.com", "password_hash": "$argon2id$forged"}),
        ))
        .await?;
    assert_eq!(response.status(), 400);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("password_hash"));

    Ok(())
}

#[tokio::test]
async fn test_update_requires_principal() -> Result<()> {
    let router = setup().await?;

    let response = router
        .oneshot(api_request(
            "PUT",
            "/identity/me",
            json!({"email": "anon@example.com"}),
        ))
        .await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

// ─── Test 10: Scheduler callback echoes its payload ─────────────────────

#[tokio::test]
async fn test_deactivate_inactive_echoes_payload() -> Result<()> {
    let router = setup().await?;

    let payload = json!({"before": "2026-01-01T00:00:00Z", "dry_run": true});
    let response = router
        .oneshot(api_request(
            "POST",
            "/identity/tasks/deactivate-inactive",
            payload.clone(),
        ))
        .await?;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["result"], "ok");
    assert_eq!(body["received"], payload);

    Ok(())
}

// ─── Test 11: An already-bound principal is never overwritten ───────────

#[tokio::test]
async fn test_identity_binding_is_idempotent() -> Result<()> {
    let router = setup().await?;

    // A principal bound upstream (e.g. by an outer layer) stays bound even
    // when the request also carries a verifiable token for someone else.
    let now = Utc::now().timestamp();
    let bound = Principal {
        subject: "admin".to_string(),
        issued_at: now,
        expires_at: now + 3600,
    };
    let request = Request::builder()
        .method("GET")
        .uri("/identity/me")
        .header("Authorization", format!("Bearer {}", token_for("bob")))
        .extension(bound)
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await?;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["username"], "admin");

    Ok(())
}
