//! `orgadmin-core`: shared domain primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod validation;

pub use error::{DomainError, DomainResult};
pub use id::{EntityId, LogId, RoleId, UserId};
pub use validation::{FieldError, TextRule, ValidationErrors};
