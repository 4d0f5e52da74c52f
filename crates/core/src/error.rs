//! Domain error model.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, policy, missing
/// records). Storage and transport failures belong to their own layers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed schema validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is refused by policy (system-managed target, self-deletion, ...).
    #[error("forbidden by policy: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}
