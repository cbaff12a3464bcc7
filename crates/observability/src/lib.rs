//! Tracing/logging setup shared by the simulator binary and tests.

pub mod tracing;

pub use crate::tracing::{FileOutput, LogConfig, LogFormat, WorkerGuard};

/// Initialize process-wide logging with defaults (human-readable, `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let _ = tracing::init_with(&LogConfig::default());
}
