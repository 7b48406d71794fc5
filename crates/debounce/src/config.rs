//! Debounce configuration

use crate::error::DebounceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted delay in milliseconds
pub const MAX_DELAY_MS: u64 = 10_000;

/// Debounce configuration (`[debounce]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period before a value settles (default: 300ms)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

impl DebounceConfig {
    /// Configured delay
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Check the delay is within 0-10000ms
    pub fn validate(&self) -> crate::Result<()> {
        if self.delay_ms > MAX_DELAY_MS {
            return Err(DebounceError::InvalidDelay(self.delay_ms));
        }
        Ok(())
    }
}

fn default_delay_ms() -> u64 {
    300
}
