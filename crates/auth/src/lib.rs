//! `orgadmin-auth`: authentication/authorization boundary.
//!
//! No HTTP or storage here: this crate owns the directory records, the
//! permission model, session tokens and the guard.

pub mod claims;
pub mod entity;
pub mod guard;
pub mod permissions;
pub mod policy;
pub mod roles;
pub mod session;
pub mod user;

pub use claims::{SessionClaims, SessionTokenCodec, TokenValidationError, validate_claims};
pub use entity::Entity;
pub use guard::{AuthError, check_auth};
pub use permissions::{Permission, PermissionSet};
pub use roles::Role;
pub use session::Session;
pub use user::{User, UserDetails};
