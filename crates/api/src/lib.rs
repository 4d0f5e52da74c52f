//! HTTP API: session resolution, permission-checked actions and routing.

pub mod actions;
pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
pub mod session;
