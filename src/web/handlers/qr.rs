// GET /qr — the WhatsApp Web login QR code.
//
// Renders the last QR payload the gateway reported as an inline SVG. Once
// the session is ready there is nothing to scan.

use axum::extract::State;
use axum::response::Html;
use qrcode::render::svg;
use qrcode::QrCode;
use tracing::warn;

use crate::web::{AppState, SessionState};

pub async fn qr_page(State(state): State<AppState>) -> Html<String> {
    let session = state.session.read().await.clone();
    Html(render_page(&session))
}

fn render_page(session: &SessionState) -> String {
    let body = match session {
        SessionState::AwaitingScan { qr } => match render_svg(qr) {
            Some(svg) => format!("<h2>Scan QR to login</h2>{svg}"),
            None => "<h2>QR code could not be rendered</h2>".to_string(),
        },
        SessionState::Ready => "<h2>Logged in – no QR needed</h2>".to_string(),
        SessionState::Starting => "<h2>Waiting for the WhatsApp gateway…</h2>".to_string(),
    };
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>GroupGuard login</title></head>\
         <body style=\"font-family:sans-serif;text-align:center\">{body}</body></html>"
    )
}

fn render_svg(payload: &str) -> Option<String> {
    match QrCode::new(payload.as_bytes()) {
        Ok(code) => Some(
            code.render::<svg::Color>()
                .min_dimensions(256, 256)
                .dark_color(svg::Color("#000000"))
                .light_color(svg::Color("#FFFFFF"))
                .build(),
        ),
        Err(e) => {
            warn!(error = %e, "Failed to encode login QR");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_page_has_no_qr() {
        let page = render_page(&SessionState::Ready);
        assert!(page.contains("Logged in – no QR needed"));
        assert!(!page.contains("<svg"));
    }

    #[test]
    fn test_awaiting_scan_renders_svg() {
        let page = render_page(&SessionState::AwaitingScan {
            qr: "2@abc,def,ghi==".to_string(),
        });
        assert!(page.contains("Scan QR to login"));
        assert!(page.contains("<svg"));
    }
}
