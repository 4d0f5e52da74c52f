use axum::{
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Json, Router,
};

use crate::actions::me::{self, SelectEntityInput};
use crate::app::errors;
use crate::app::routes::common;
use crate::context::{AppState, SessionContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(current_user))
        .route("/selected-entity", put(select_entity))
}

/// GET /api/me
pub async fn current_user(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    errors::respond(
        me::get_current_user(&state, ctx.session()).await,
        StatusCode::OK,
        "get_current_user",
        "Failed to fetch current user",
    )
}

/// PUT /api/me/selected-entity
pub async fn select_entity(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    body: Result<Json<SelectEntityInput>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return common::bad_body(rejection),
    };
    errors::respond(
        me::select_entity(&state, ctx.session(), input).await,
        StatusCode::OK,
        "select_entity",
        "Failed to select entity",
    )
}
