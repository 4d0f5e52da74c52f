//! Session middleware and route guard.
//!
//! Every request gets a [`SessionContext`] extension. Paths outside the
//! public allow-list additionally need an active session: page requests are
//! redirected to `/sign-in`, anything else gets a 401.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::debug;

use crate::app::errors;
use crate::context::{AppState, SessionContext};

pub const SIGN_IN_PATH: &str = "/sign-in";

/// Reachable without a session (the path itself and everything below it).
const PUBLIC_PATHS: &[&str] = &[
    "/sign-in",
    "/sign-up",
    "/forgot-password",
    "/reset-password",
    "/api/auth",
    "/_next",
    "/static",
    "/health",
    // Cron routes check their own bearer secret.
    "/api/cron",
];

pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = state.sessions.resolve(req.headers(), Utc::now()).await;
    let authenticated = session.is_some();
    req.extensions_mut().insert(SessionContext::new(session));

    let path = req.uri().path();
    if authenticated || is_public_path(path) {
        return next.run(req).await;
    }

    debug!(path, "request without active session");
    if wants_html(req.headers()) {
        Redirect::temporary(SIGN_IN_PATH).into_response()
    } else {
        errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
    }
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn allow_list_matches_whole_segments() {
        assert!(is_public_path("/sign-in"));
        assert!(is_public_path("/api/auth/callback"));
        assert!(is_public_path("/_next/static/chunk.js"));
        assert!(is_public_path("/api/cron/reset-database"));
        assert!(!is_public_path("/sign-inx"));
        assert!(!is_public_path("/api/roles"));
        assert!(!is_public_path("/"));
    }

    #[test]
    fn html_detection() {
        let mut headers = HeaderMap::new();
        assert!(!wants_html(&headers));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        assert!(wants_html(&headers));
    }
}
