//! Auth guard: the check run before every action.

use thiserror::Error;

use crate::{Permission, Session};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized: No active session")]
    NoSession,

    #[error("Unauthorized: No active session")]
    Inactive,

    #[error("Unauthorized: Missing permission {0}")]
    MissingPermission(String),
}

/// Require an active session, and `required` in its effective permissions
/// when given.
///
/// - No IO
/// - No caching: callers run it once per action
pub fn check_auth<'s>(
    session: Option<&'s Session>,
    required: Option<&Permission>,
) -> Result<&'s Session, AuthError> {
    let session = session.ok_or(AuthError::NoSession)?;

    if !session.is_active() {
        return Err(AuthError::Inactive);
    }

    if let Some(required) = required {
        if !session.has_permission(required) {
            tracing::debug!(
                user_id = %session.user_id(),
                permission = %required,
                "permission check failed"
            );
            return Err(AuthError::MissingPermission(required.as_str().to_string()));
        }
    }

    Ok(session)
}
