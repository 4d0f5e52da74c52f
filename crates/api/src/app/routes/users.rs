//! User endpoints.

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use orgadmin_core::{EntityId, RoleId, UserId};

use crate::actions::users::{
    self, AssignEntitiesInput, AssignRolesInput, CreateUserInput, SetUserActiveInput,
    UpdateUserInput,
};
use crate::app::errors;
use crate::app::routes::common;
use crate::context::{AppState, SessionContext};

// ─────────────────────────────────────────────────────────────────────────────
// Request bodies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RoleIdsBody {
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Deserialize)]
pub struct EntityIdsBody {
    pub entity_ids: Vec<EntityId>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
    pub active: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", put(update_user).delete(delete_user))
        .route("/:id/roles", put(assign_roles))
        .route("/:id/entities", put(assign_entities))
        .route("/:id/active", put(set_active))
        .route("/:id/verify-email", post(verify_email))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/users
pub async fn list_users(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    errors::respond(
        users::get_users(&state, ctx.session()).await,
        StatusCode::OK,
        "get_users",
        "Failed to fetch users",
    )
}

/// POST /api/users
pub async fn create_user(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    body: Result<Json<CreateUserInput>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    errors::respond(
        users::create_user(&state, ctx.session(), input).await,
        StatusCode::CREATED,
        "create_user",
        "Failed to create user",
    )
}

/// PUT /api/users/:id
pub async fn update_user(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserInput>, JsonRejection>,
) -> Response {
    let id: UserId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    errors::respond(
        users::update_user(&state, ctx.session(), id, input).await,
        StatusCode::OK,
        "update_user",
        "Failed to update user",
    )
}

/// DELETE /api/users/:id
pub async fn delete_user(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    errors::respond(
        users::delete_user(&state, ctx.session(), id).await,
        StatusCode::OK,
        "delete_user",
        "Failed to delete user",
    )
}

/// PUT /api/users/:id/roles
pub async fn assign_roles(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<RoleIdsBody>, JsonRejection>,
) -> Response {
    let user_id: UserId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    let input = AssignRolesInput {
        user_id,
        role_ids: body.role_ids,
    };
    errors::respond(
        users::assign_roles_to_user(&state, ctx.session(), input).await,
        StatusCode::OK,
        "assign_roles_to_user",
        "Failed to assign roles",
    )
}

/// PUT /api/users/:id/entities
pub async fn assign_entities(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<EntityIdsBody>, JsonRejection>,
) -> Response {
    let user_id: UserId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    let input = AssignEntitiesInput {
        user_id,
        entity_ids: body.entity_ids,
    };
    errors::respond(
        users::assign_entities_to_user(&state, ctx.session(), input).await,
        StatusCode::OK,
        "assign_entities_to_user",
        "Failed to assign entities",
    )
}

/// PUT /api/users/:id/active
pub async fn set_active(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<ActiveBody>, JsonRejection>,
) -> Response {
    let user_id: UserId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    let input = SetUserActiveInput {
        user_id,
        active: body.active,
    };
    errors::respond(
        users::set_user_active(&state, ctx.session(), input).await,
        StatusCode::OK,
        "set_user_active",
        "Failed to update user status",
    )
}

/// POST /api/users/:id/verify-email
pub async fn verify_email(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let user_id: UserId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    errors::respond(
        users::mark_user_email_verified(&state, ctx.session(), user_id).await,
        StatusCode::OK,
        "mark_user_email_verified",
        "Failed to verify email",
    )
}
