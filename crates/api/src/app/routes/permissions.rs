use axum::{extract::Extension, http::StatusCode, response::Response};

use crate::actions::permissions;
use crate::app::errors;
use crate::context::{AppState, SessionContext};

/// GET /api/permissions
pub async fn list_permissions(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    errors::respond(
        permissions::get_permissions(&state, ctx.session()).await,
        StatusCode::OK,
        "get_permissions",
        "Failed to fetch permissions",
    )
}
