//! HTTP + WebSocket API server.
//!
//! Routes live under `/api/v1/interview`, matching the paths the frontend
//! calls. CORS is restricted to the configured origin (credentials flow
//! through the browser, so a wildcard is only honored when explicitly
//! configured as `*`).

pub mod realtime;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::db::Db;
use crate::vector::VectorStore;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub vector: Arc<dyn VectorStore>,
    pub config: Arc<Config>,
    pub events: realtime::EventHub,
}

/// Build the application router with all routes registered.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/v1/interview/question-bank",
            get(routes::question_bank),
        )
        .route(
            "/api/v1/interview/question-bank/add",
            post(routes::add_question),
        )
        .route(
            "/api/v1/interview/question-bank/:id",
            get(routes::get_question).delete(routes::delete_question),
        )
        .route("/api/v1/interview/sessions", get(routes::list_sessions))
        .route("/api/v1/interview/sessions/:id", get(routes::get_session))
        .route("/ws", get(realtime::ws_handler))
        .with_state(state)
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {origin}"))?,
        )
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers(Any))
}

/// Bind the configured port and serve until shutdown.
///
/// This is the last stage of startup; it only runs after the fatal steps
/// have all succeeded.
pub async fn run(config: Arc<Config>, db: Db, vector: Arc<dyn VectorStore>) -> Result<()> {
    let port = config.server.port;
    let cors = cors_layer(&config.server.cors_origin)?;

    let state = AppState {
        db,
        vector,
        config,
        events: realtime::EventHub::new(256),
    };
    let app = router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    info!("APP IS LISTENING ON PORT {port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

// ── Tests ────────────────────────────────────────────────────────────
