use axum::{
    extract::{Extension, Query, rejection::QueryRejection},
    http::StatusCode,
    response::Response,
};

use crate::actions::logs::{self, LogQuery};
use crate::app::errors;
use crate::app::routes::common;
use crate::context::{AppState, SessionContext};

/// GET /api/logs?start=<rfc3339>&end=<rfc3339>
pub async fn list_logs(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<SessionContext>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return common::bad_query(rejection),
    };
    errors::respond(
        logs::get_logs(&state, ctx.session(), query).await,
        StatusCode::OK,
        "get_logs",
        "Failed to fetch logs",
    )
}
