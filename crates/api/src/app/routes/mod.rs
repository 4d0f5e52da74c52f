use axum::{Router, routing::get};

pub mod common;
pub mod cron;
pub mod entities;
pub mod logs;
pub mod me;
pub mod permissions;
pub mod roles;
pub mod system;
pub mod users;

/// Router for every JSON endpoint. Session gating is applied by the caller.
pub fn router() -> Router {
    Router::new()
        .route("/api/permissions", get(permissions::list_permissions))
        .route("/api/logs", get(logs::list_logs))
        .nest("/api/me", me::router())
        .nest("/api/roles", roles::router())
        .nest("/api/users", users::router())
        .nest("/api/entities", entities::router())
        .nest("/api/cron", cron::router())
}
