// POST /webhook/* — events pushed by the WhatsApp Web gateway.
//
//   /webhook/message  InboundMessage       → moderated on its own task, 202
//   /webhook/qr       {"qr": "<payload>"}  → session awaiting scan
//   /webhook/ready    {}                   → session authenticated

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::transport::InboundMessage;
use crate::web::{api_error, AppState, SessionState};

#[derive(Debug, Deserialize)]
pub struct QrEvent {
    pub qr: String,
}

/// Accept one inbound message and moderate it in the background.
///
/// The gateway only learns that the message was queued; every moderation
/// outcome (including errors) ends up in the log and the audit trail.
pub async fn message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Response {
    let Some(moderator) = state.moderator.clone() else {
        return api_error(StatusCode::SERVICE_UNAVAILABLE, "Moderation is not running");
    };

    tokio::spawn(async move {
        moderator.handle(message).await;
    });

    StatusCode::ACCEPTED.into_response()
}

pub async fn qr(State(state): State<AppState>, Json(event): Json<QrEvent>) -> StatusCode {
    info!("QR received, scan it at /qr");
    *state.session.write().await = SessionState::AwaitingScan { qr: event.qr };
    StatusCode::NO_CONTENT
}

pub async fn ready(State(state): State<AppState>) -> StatusCode {
    info!("WhatsApp session ready");
    *state.session.write().await = SessionState::Ready;
    StatusCode::NO_CONTENT
}
