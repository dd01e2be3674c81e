// GET /api/actions — recent audit log entries as JSON.
//
// Optional ?limit= parameter (default 50, max 500).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct ActionsQuery {
    pub limit: Option<usize>,
}

/// GET /api/actions — audit entries, newest first.
pub async fn list_actions(
    State(state): State<AppState>,
    Query(params): Query<ActionsQuery>,
) -> Response {
    let limit = params.limit.unwrap_or(50).min(500);

    if let Err(e) = state.db.refresh().await {
        warn!(error = %e, "Failed to refresh store, serving cached entries");
    }

    match state.db.recent_actions(limit).await {
        Ok(actions) => Json(serde_json::json!({
            "count": actions.len(),
            "actions": actions,
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load audit log");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load audit log")
        }
    }
}
