//! Process-wide logging setup.

/// Tracing subscriber configuration.
pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize tracing/logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
