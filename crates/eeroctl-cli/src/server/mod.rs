//! JSON bridge for the chore scheduler.
//!
//! A handful of routes to check, pause and unpause the configured profiles,
//! run the two-step login, and wait for a scheduled pause before lifting it.
//! CORS is open to any origin so the scheduler's web app can call in.

mod error;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use eeroctl_core::{Config, EeroClient, PendingLogin};

/// Shared by every request
pub struct AppState {
    pub client: EeroClient,
    pub config: Config,
    /// Login flow in progress. Held for the whole of a login or verify call,
    /// so concurrent requests cannot interleave the two steps.
    pub login: Mutex<Option<PendingLogin>>,
    /// Cancelled on shutdown to stop long polls
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(client: EeroClient, config: Config) -> Self {
        Self {
            client,
            config,
            login: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/status", get(routes::status_all))
        .route("/api/status/{profile}", get(routes::status))
        .route("/api/pause/{profile}", post(routes::pause))
        .route("/api/unpause/{profile}", post(routes::unpause))
        .route("/api/login", post(routes::login))
        .route("/api/login/verify", post(routes::verify))
        .route("/api/auth/status", get(routes::auth_status))
        .route(
            "/api/unpause-when-ready/{profile}",
            post(routes::unpause_when_ready),
        )
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    println!("eero bridge running at http://{addr}");
    println!("API endpoints:");
    println!("  GET  /api/status                      - Get all profiles status");
    println!("  GET  /api/status/:profile             - Get specific profile status");
    println!("  POST /api/pause/:profile              - Pause a profile");
    println!("  POST /api/unpause/:profile            - Unpause a profile");
    println!("  POST /api/unpause-when-ready/:profile - Wait for a pause, then unpause");
    println!("  POST /api/login, /api/login/verify    - Two-step login");
    println!("  GET  /api/auth/status                 - Check authentication");
    info!(profiles = state.config.profiles.len(), %addr, "Bridge started");

    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    Ok(())
}
