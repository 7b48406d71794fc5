//! Debounce error types

use thiserror::Error;

/// Errors returned by [`crate::Debouncer`] and [`crate::DebounceConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DebounceError {
    /// No timer facility is available on the calling thread
    /// (no tokio runtime, or the runtime is shutting down)
    #[error("timer facility unavailable: no tokio runtime on this thread")]
    ResourceExhausted,

    /// The debouncer has been torn down
    #[error("debouncer has been disposed")]
    Disposed,

    /// Configured delay is outside 0-10000ms
    #[error("debounce.delay_ms must be between 0 and 10000 (got {0})")]
    InvalidDelay(u64),
}
