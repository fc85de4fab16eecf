use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use vakt_common::models::user::Role;
use vakt_db::{create_pool, run_migrations, NewUser, PgUserStore, UserStore};
use vakt_server::auth::{hash_password, SigningKey};
use vakt_server::config::load_config;
use vakt_server::identity::IdentityService;
use vakt_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Vakt identity server");

    // Load configuration
    let config_path =
        std::env::var("VAKT_CONFIG").unwrap_or_else(|_| "server-config.yaml".to_string());

    tracing::info!("Loading config from: {}", config_path);
    let config = load_config(&config_path)?;

    // Create database pool
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.db.url)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // Signing key: the configured Base64 secret, or an ephemeral key.
    // A malformed secret is fatal here rather than silently ignored.
    let signing_key = SigningKey::from_config(config.auth.jwt_secret.as_deref())?;

    let store = Arc::new(PgUserStore::new(pool));

    // Seed initial user if configured
    if let Some(initial_user) = &config.auth.initial_user {
        match store.find_by_username(&initial_user.username).await {
            Ok(Some(_)) => {
                tracing::info!(
                    "Initial user '{}' already exists, skipping seed",
                    initial_user.username
                );
            }
            Ok(None) => {
                let password_hash = hash_password(&initial_user.password)
                    .context("Failed to hash initial user password")?;
                store
                    .create(NewUser {
                        id: uuid::Uuid::new_v4().to_string(),
                        username: initial_user.username.clone(),
                        password_hash,
                        email: initial_user.email.clone(),
                        address: None,
                        phone: None,
                        role: Role::parse_lossy(&initial_user.role).as_str().to_string(),
                    })
                    .await
                    .context("Failed to create initial user")?;
                tracing::info!("Created initial user: {}", initial_user.username);
            }
            Err(e) => {
                tracing::warn!("Failed to check for initial user: {:#}", e);
            }
        }
    }

    let identity = IdentityService::new(store);

    // Start the gRPC listener alongside the HTTP server
    let cancel_token = CancellationToken::new();
    let grpc_addr = config
        .grpc_listen
        .parse()
        .with_context(|| format!("Invalid gRPC listen address: {}", config.grpc_listen))?;
    let grpc_task = tokio::spawn(vakt_server::grpc::serve(
        identity.clone(),
        grpc_addr,
        cancel_token.clone(),
    ));

    // Build application state and router
    let state = AppState::new(identity, signing_key, config.clone());
    let app = vakt_server::web::build_router(state);

    // Start HTTP server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;

    tracing::info!("Server listening on {}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await
        .context("Server error")?;

    // The HTTP side is down; take the gRPC listener with it
    cancel_token.cancel();
    grpc_task
        .await
        .context("gRPC server task panicked")?
        .context("gRPC server failed")?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping...");
    cancel_token.cancel();
}
