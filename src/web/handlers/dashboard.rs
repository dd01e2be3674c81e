// GET / — server-rendered audit log table.
//
// Plain HTML, no scripts. Every user-supplied string (names, chat names,
// message text) goes through html_escape before it reaches the page.

use axum::extract::{Query, State};
use axum::response::Html;
use html_escape::encode_text;
use serde::Deserialize;
use tracing::warn;

use crate::db::models::{AuditLogEntry, StoreStats};
use crate::web::AppState;

#[derive(Deserialize, Default)]
pub struct DashboardQuery {
    pub limit: Option<usize>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Html<String> {
    let limit = params.limit.unwrap_or(200).min(1000);

    if let Err(e) = state.db.refresh().await {
        warn!(error = %e, "Failed to refresh store, rendering cached entries");
    }

    let actions = state.db.recent_actions(limit).await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load audit log");
        Vec::new()
    });
    let stats = state.db.stats().await.unwrap_or_default();

    Html(render(&actions, &stats))
}

pub fn render(actions: &[AuditLogEntry], stats: &StoreStats) -> String {
    let mut rows = String::new();
    for entry in actions {
        rows.push_str(&format!(
            "<tr class=\"{kind}\"><td>{time}</td><td>{kind}</td><td>{user}</td><td>{number}</td>\
             <td>{chat}</td><td>{message}</td><td>{strikes}</td></tr>\n",
            kind = entry.kind.as_str(),
            time = entry.time.format("%Y-%m-%d %H:%M:%S UTC"),
            user = encode_text(&entry.user),
            number = encode_text(&entry.number),
            chat = encode_text(entry.chat.as_deref().unwrap_or("private")),
            message = encode_text(entry.message.as_deref().unwrap_or("")),
            strikes = entry.strikes.map(|s| s.to_string()).unwrap_or_default(),
        ));
    }

    if actions.is_empty() {
        rows.push_str("<tr><td colspan=\"7\"><em>No moderation actions yet.</em></td></tr>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>GroupGuard dashboard</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }}
th {{ background: #f4f4f4; }}
tr.blocked td {{ background: #fdecea; }}
tr.sticker_violation td {{ background: #fff8e1; }}
</style>
</head>
<body>
<h1>GroupGuard moderation log</h1>
<p>{total} actions: {violations} violations, {stickers} sticker violations, {blocks} blocks across {groups} groups.</p>
<table>
<thead><tr><th>Time</th><th>Type</th><th>User</th><th>Number</th><th>Chat</th><th>Message</th><th>Strikes</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#,
        total = stats.actions,
        violations = stats.violations,
        stickers = stats.sticker_violations,
        blocks = stats.blocks,
        groups = stats.groups,
    )
}
