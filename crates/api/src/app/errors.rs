use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use orgadmin_auth::AuthError;

use crate::actions::{ActionError, ActionResult};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "ok": false,
            "code": code,
            "error": message.into(),
        })),
    )
        .into_response()
}

pub fn json_ok<T: Serialize>(status: StatusCode, data: T) -> axum::response::Response {
    (status, axum::Json(json!({ "ok": true, "data": data }))).into_response()
}

/// Log the failure with its cause and answer with the action's generic
/// message. Validation failures also carry the field messages.
pub fn action_failed(
    action: &'static str,
    failure: &'static str,
    err: ActionError,
) -> axum::response::Response {
    error!(action, error = %err, "action failed");

    let (status, code) = match &err {
        ActionError::Unauthorized(AuthError::MissingPermission(_)) => {
            (StatusCode::FORBIDDEN, "unauthorized")
        }
        ActionError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        ActionError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        ActionError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ActionError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        ActionError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        ActionError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    match err {
        ActionError::Validation(errors) => (
            status,
            axum::Json(json!({
                "ok": false,
                "code": code,
                "error": failure,
                "details": errors,
            })),
        )
            .into_response(),
        _ => json_error(status, code, failure),
    }
}

/// Map an action result onto the JSON envelope.
pub fn respond<T: Serialize>(
    result: ActionResult<T>,
    ok_status: StatusCode,
    action: &'static str,
    failure: &'static str,
) -> axum::response::Response {
    match result {
        Ok(data) => json_ok(ok_status, data),
        Err(err) => action_failed(action, failure, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgadmin_core::ValidationErrors;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (ActionError::Unauthorized(AuthError::NoSession), StatusCode::UNAUTHORIZED),
            (
                ActionError::Unauthorized(AuthError::MissingPermission("role_edit".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                ActionError::Validation(ValidationErrors::single("name", "Name is required")),
                StatusCode::BAD_REQUEST,
            ),
            (ActionError::NotFound("role".into()), StatusCode::NOT_FOUND),
            (ActionError::Conflict("email".into()), StatusCode::CONFLICT),
            (ActionError::Internal("db".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(action_failed("test", "Failed", err).status(), status);
        }
    }
}
