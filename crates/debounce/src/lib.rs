//! Trailing-edge debouncing for namecheck
//!
//! This crate provides:
//! - `Debouncer<T>`: a settled value that follows a rapidly-changing input
//!   once the input has been quiet for a configurable delay
//! - Cancellation on re-observe and on teardown (no late commits)
//! - `DebounceConfig` for loading the delay from TOML

pub mod config;
pub mod debouncer;
pub mod error;

// Re-exports
pub use config::DebounceConfig;
pub use debouncer::{Debouncer, Phase};
pub use error::DebounceError;

use std::time::Duration;

/// Result type for debounce operations
pub type Result<T> = std::result::Result<T, DebounceError>;

/// Convert signed milliseconds into a delay
///
/// Negative values are clamped to zero.
pub fn delay_from_millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}
