//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection, seeding and the audit writer
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent JSON envelopes

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppState;
use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(state.clone()))
                .layer(axum::middleware::from_fn_with_state(
                    state,
                    middleware::session_middleware,
                )),
        )
}
