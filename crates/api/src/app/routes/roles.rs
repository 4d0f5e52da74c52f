//! Role endpoints.

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use orgadmin_core::RoleId;

use crate::actions::roles::{self, AssignPermissionsInput, RoleInput};
use crate::app::errors;
use crate::app::routes::common;
use crate::context::{AppState, SessionContext};

// ─────────────────────────────────────────────────────────────────────────────
// Request bodies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PermissionCodesBody {
    pub permission_codes: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", put(update_role).delete(delete_role))
        .route("/:id/permissions", put(assign_permissions))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/roles
pub async fn list_roles(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    errors::respond(
        roles::get_roles(&state, ctx.session()).await,
        StatusCode::OK,
        "get_roles",
        "Failed to fetch roles",
    )
}

/// POST /api/roles
pub async fn create_role(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    body: Result<Json<RoleInput>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    errors::respond(
        roles::create_role(&state, ctx.session(), input).await,
        StatusCode::CREATED,
        "create_role",
        "Failed to create role",
    )
}

/// PUT /api/roles/:id
pub async fn update_role(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<RoleInput>, JsonRejection>,
) -> Response {
    let id: RoleId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    errors::respond(
        roles::update_role(&state, ctx.session(), id, input).await,
        StatusCode::OK,
        "update_role",
        "Failed to update role",
    )
}

/// DELETE /api/roles/:id
pub async fn delete_role(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let id: RoleId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    errors::respond(
        roles::delete_role(&state, ctx.session(), id).await,
        StatusCode::OK,
        "delete_role",
        "Failed to delete role",
    )
}

/// PUT /api/roles/:id/permissions
pub async fn assign_permissions(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<PermissionCodesBody>, JsonRejection>,
) -> Response {
    let role_id: RoleId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    let input = AssignPermissionsInput {
        role_id,
        permission_codes: body.permission_codes,
    };
    errors::respond(
        roles::assign_permissions_to_role(&state, ctx.session(), input).await,
        StatusCode::OK,
        "assign_permissions_to_role",
        "Failed to assign permissions",
    )
}
