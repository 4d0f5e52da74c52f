//! Entity endpoints.

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use orgadmin_core::EntityId;

use crate::actions::entities::{self, EntityInput, SetEntityActiveInput};
use crate::app::errors;
use crate::app::routes::common;
use crate::context::{AppState, SessionContext};

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
    pub active: bool,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_entities).post(create_entity))
        .route("/:id", put(update_entity))
        .route("/:id/active", put(set_entity_active))
}

/// GET /api/entities
pub async fn list_entities(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    errors::respond(
        entities::get_entities(&state, ctx.session()).await,
        StatusCode::OK,
        "get_entities",
        "Failed to fetch entities",
    )
}

/// POST /api/entities
pub async fn create_entity(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    body: Result<Json<EntityInput>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    errors::respond(
        entities::create_entity(&state, ctx.session(), input).await,
        StatusCode::CREATED,
        "create_entity",
        "Failed to create entity",
    )
}

/// PUT /api/entities/:id
pub async fn update_entity(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<EntityInput>, JsonRejection>,
) -> Response {
    let id: EntityId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    errors::respond(
        entities::update_entity(&state, ctx.session(), id, input).await,
        StatusCode::OK,
        "update_entity",
        "Failed to update entity",
    )
}

/// PUT /api/entities/:id/active
pub async fn set_entity_active(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<ActiveBody>, JsonRejection>,
) -> Response {
    let entity_id: EntityId = match common::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    let input = SetEntityActiveInput {
        entity_id,
        active: body.active,
    };
    errors::respond(
        entities::set_entity_active(&state, ctx.session(), input).await,
        StatusCode::OK,
        "set_entity_active",
        "Failed to update entity status",
    )
}
