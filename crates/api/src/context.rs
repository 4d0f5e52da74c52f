//! Shared application state and per-request context.

use std::sync::Arc;

use orgadmin_auth::{Session, SessionTokenCodec};
use orgadmin_infra::{AuditLogger, AuditStore, DirectoryStore};

use crate::config::AppConfig;
use crate::session::SessionResolver;

/// Everything a handler or action needs, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn DirectoryStore>,
    pub audit_store: Arc<dyn AuditStore>,
    pub audit: AuditLogger,
    pub sessions: SessionResolver,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        directory: Arc<dyn DirectoryStore>,
        audit_store: Arc<dyn AuditStore>,
        audit: AuditLogger,
    ) -> Self {
        let codec = SessionTokenCodec::new(config.session_secret.as_bytes());
        Self {
            sessions: SessionResolver::new(directory.clone(), codec),
            directory,
            audit_store,
            audit,
            config: Arc::new(config),
        }
    }
}

/// Session of the current request, as resolved by the session middleware.
///
/// Always present in request extensions; `None` inside means anonymous.
#[derive(Debug, Clone, Default)]
pub struct SessionContext(Option<Arc<Session>>);

impl SessionContext {
    pub fn new(session: Option<Session>) -> Self {
        Self(session.map(Arc::new))
    }

    pub fn session(&self) -> Option<&Session> {
        self.0.as_deref()
    }
}
