use core::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::Response;

use orgadmin_core::DomainError;

use crate::app::errors;

/// Parse a path id; a bad id is a 400 with the parse error.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse()
        .map_err(|e: DomainError| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub fn bad_body(rejection: JsonRejection) -> Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn bad_query(rejection: QueryRejection) -> Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}
