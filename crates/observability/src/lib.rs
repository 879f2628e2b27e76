//! Tracing and logging setup shared by every `reportdesk` binary.

pub mod tracing;

pub use crate::tracing::{LogConfig, LogConfigError, LogFormat, ENV_LOG_FORMAT};

/// Initialize process-wide logging with `config`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(config: &LogConfig) {
    crate::tracing::init(config);
}
