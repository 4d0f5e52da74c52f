//! Scheduled maintenance endpoints. Authenticated by the cron bearer secret,
//! not by a user session.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::app::errors;
use crate::context::AppState;
use crate::session::extract_bearer;

pub fn router() -> Router {
    Router::new().route("/reset-database", get(reset_database))
}

/// GET /api/cron/reset-database
pub async fn reset_database(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Response {
    if !bearer_matches(&headers, &state.config.cron_secret) {
        warn!("cron request rejected");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error": "Unauthorized" })),
        )
            .into_response();
    }

    // Entries still queued would otherwise land after the wipe.
    if let Err(err) = state.audit.flush().await {
        warn!(error = %err, "audit writer unavailable before reset");
    }

    match orgadmin_infra::reset(state.directory.as_ref(), state.audit_store.as_ref()).await {
        Ok(counts) => {
            info!(?counts, "database reset");
            errors::json_ok(StatusCode::OK, counts)
        }
        Err(err) => {
            error!(error = %err, "database reset failed");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Failed to reset database",
            )
        }
    }
}

fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    match extract_bearer(headers) {
        Some(token) => token.as_bytes().ct_eq(secret.as_bytes()).into(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header};

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn only_the_exact_secret_matches() {
        assert!(bearer_matches(&with_auth("Bearer cron-secret"), "cron-secret"));
        assert!(!bearer_matches(&with_auth("Bearer cron-secre"), "cron-secret"));
        assert!(!bearer_matches(&with_auth("Bearer cron-secret2"), "cron-secret"));
        assert!(!bearer_matches(&with_auth("cron-secret"), "cron-secret"));
        assert!(!bearer_matches(&HeaderMap::new(), "cron-secret"));
    }
}
