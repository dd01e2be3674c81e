// Web server — Axum-based webhook receiver, QR login page and dashboard.
//
// Two shapes of the same router:
//   bot mode        webhooks + /qr + dashboard, with a Moderator attached
//   dashboard mode  dashboard + /api/actions only, read-only over the store
//
// The gateway pushes inbound messages to /webhook/message; each one is
// handed to the Moderator on its own task and acknowledged with 202 before
// moderation finishes.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::Database;
use crate::moderation::Moderator;

pub mod auth;
pub mod handlers;

/// WhatsApp Web login state as last reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No event received yet.
    #[default]
    Starting,
    /// The gateway is waiting for a scan of this QR payload.
    AwaitingScan { qr: String },
    /// Session authenticated.
    Ready,
}

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    /// Present in bot mode only; the dashboard process never moderates.
    pub moderator: Option<Arc<Moderator>>,
    pub session: Arc<RwLock<SessionState>>,
    /// Expected bearer token on /webhook/* calls.
    pub webhook_token: Option<String>,
}

impl AppState {
    /// State for the bot process.
    pub fn bot(moderator: Arc<Moderator>, webhook_token: Option<String>) -> Self {
        Self {
            db: Arc::clone(moderator.db()),
            moderator: Some(moderator),
            session: Arc::new(RwLock::new(SessionState::default())),
            webhook_token,
        }
    }

    /// State for the read-only dashboard process.
    pub fn dashboard(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            moderator: None,
            session: Arc::new(RwLock::new(SessionState::default())),
            webhook_token: None,
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let mode = if state.moderator.is_some() {
        "bot"
    } else {
        "dashboard"
    };
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!(mode, "GroupGuard listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::dashboard::dashboard))
        .route("/api/actions", get(handlers::actions::list_actions))
        .route("/health", get(health));

    if state.moderator.is_some() {
        let webhooks = Router::new()
            .route("/webhook/message", post(handlers::webhook::message))
            .route("/webhook/qr", post(handlers::webhook::qr))
            .route("/webhook/ready", post(handlers::webhook::ready))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth::require_gateway_token,
            ));

        router = router
            .merge(webhooks)
            .route("/qr", get(handlers::qr::qr_page));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
