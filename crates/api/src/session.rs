//! Session resolution: request headers to an authenticated principal.

use std::sync::Arc;

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use orgadmin_auth::{PermissionSet, Session, SessionTokenCodec};
use orgadmin_infra::DirectoryStore;

/// Cookie set by the sign-in flow.
pub const SESSION_COOKIE: &str = "session_token";

/// Resolves the [`Session`] of a request. Read-only.
#[derive(Clone)]
pub struct SessionResolver {
    directory: Arc<dyn DirectoryStore>,
    codec: SessionTokenCodec,
}

impl SessionResolver {
    pub fn new(directory: Arc<dyn DirectoryStore>, codec: SessionTokenCodec) -> Self {
        Self { directory, codec }
    }

    /// `None` for a missing, invalid or expired token, an unknown user or an
    /// inactive user. A store failure while loading the user or its roles is
    /// logged at `warn` and also yields `None`, so the request is treated as
    /// anonymous (401 or redirect) rather than failing with a 500.
    pub async fn resolve(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<Session> {
        let token = extract_session_token(headers)?;

        let claims = match self.codec.verify(&token, now) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(error = %err, "session token rejected");
                return None;
            }
        };

        let user = match self.directory.get_user(claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(user_id = %claims.sub, "session user not found");
                return None;
            }
            Err(err) => {
                warn!(user_id = %claims.sub, error = %err, "failed to load session user");
                return None;
            }
        };

        if !user.active {
            debug!(user_id = %user.id, "session user is inactive");
            return None;
        }

        let roles = match self.directory.roles_of(&user).await {
            Ok(roles) => roles,
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "failed to load session roles");
                return None;
            }
        };

        Some(Session::new(user, PermissionSet::from_roles(roles.iter())))
    }
}

impl core::fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionResolver").finish_non_exhaustive()
    }
}

/// The `session_token` cookie, else an `Authorization: Bearer` token.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| extract_bearer(headers).map(str::to_string))
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
