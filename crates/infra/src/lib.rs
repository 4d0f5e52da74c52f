//! Infrastructure layer: directory/audit storage, the audit writer, and the
//! seed/reset routines.

pub mod audit_writer;
pub mod reset;
pub mod seed;
pub mod store;

pub use audit_writer::{AuditLogger, AuditScope};
pub use reset::reset;
pub use seed::{SeedReport, seed};
pub use store::postgres::migrate;
pub use store::{
    AuditStore, DirectoryStore, InMemoryAuditStore, InMemoryDirectory, PostgresAuditStore,
    PostgresDirectory, ResetCounts, StoreError,
};
