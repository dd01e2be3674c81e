// Webhook auth middleware — shared bearer token between bot and gateway.
//
// When GATEWAY_TOKEN is set, the gateway must send
// `Authorization: Bearer <token>` on every /webhook/* call. Without a token
// the webhooks are open, which is only sensible when the bot listens on
// localhost next to the gateway.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::AppState;

/// Axum middleware: reject webhook calls without the shared token with 401.
pub async fn require_gateway_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.webhook_token.as_deref() {
        if !has_valid_token(&request, expected) {
            warn!(path = %request.uri().path(), "Rejected webhook call without valid token");
            return super::api_error(StatusCode::UNAUTHORIZED, "Invalid gateway token");
        }
    }
    next.run(request).await
}

fn has_valid_token(request: &Request, expected: &str) -> bool {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|provided| constant_time_eq(provided.trim(), expected))
}

/// Constant-time string comparison, to avoid leaking the token through
/// response timing.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
