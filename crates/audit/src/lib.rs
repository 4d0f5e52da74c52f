//! Audit log model: the closed set of logged actions and the append-only
//! entry records.
//!
//! Writing and querying live in `orgadmin-infra`; this crate holds no IO.

pub mod action;
pub mod entry;
pub mod error;

pub use action::{LogAction, LogActionType, LogScope, SubjectRef};
pub use entry::{LogEntry, LogFilter, LogView, NewLogEntry};
pub use error::AuditError;
