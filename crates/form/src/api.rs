//! Remote collaborator contract and its in-process mock

use crate::form::FormError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from the remote API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The remote service could not be reached
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Remote calls the form depends on
#[async_trait]
pub trait FormApi: Send + Sync {
    /// Fetch the ordered list of selectable locations
    async fn fetch_locations(&self) -> Result<Vec<String>, ApiError>;

    /// Check whether `name` is still free
    ///
    /// Callers should only pass debounced (settled) names.
    async fn check_name_available(&self, name: &str) -> Result<bool, ApiError>;
}

/// Mock API configuration (`[api]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockApiConfig {
    /// Simulated round-trip latency (default: 250ms)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Locations returned by `fetch_locations`
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// Names reported as taken (trimmed, case-insensitive)
    #[serde(default = "default_taken_names")]
    pub taken_names: Vec<String>,
}

impl Default for MockApiConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            locations: default_locations(),
            taken_names: default_taken_names(),
        }
    }
}

impl MockApiConfig {
    /// Check latency is within 0-10000ms and locations are usable
    pub fn validate(&self) -> crate::Result<()> {
        if self.latency_ms > 10_000 {
            return Err(FormError::InvalidConfig(format!(
                "api.latency_ms must be between 0 and 10000 (got {})",
                self.latency_ms
            )));
        }
        if self.locations.iter().any(|l| l.trim().is_empty()) {
            return Err(FormError::InvalidConfig(
                "api.locations must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_latency_ms() -> u64 {
    250
}

fn default_locations() -> Vec<String> {
    ["Canada", "China", "USA", "Brazil"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_taken_names() -> Vec<String> {
    vec!["invalid name".to_string()]
}

/// In-process stand-in for the remote API
pub struct MockApi {
    latency: Duration,
    locations: Vec<String>,
    /// Normalized taken names
    taken: Vec<String>,
    available: AtomicBool,
    /// Every name passed to `check_name_available`, in call order
    checked: Mutex<Vec<String>>,
}

impl MockApi {
    /// Create a mock from configuration
    pub fn new(config: &MockApiConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.latency_ms),
            locations: config.locations.clone(),
            taken: config.taken_names.iter().map(|n| normalize(n)).collect(),
            available: AtomicBool::new(true),
            checked: Mutex::new(Vec::new()),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Names checked so far
    pub fn checked_names(&self) -> Vec<String> {
        self.checked.lock().clone()
    }

    async fn round_trip(&self, call: &str) -> Result<(), ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable(format!("{} failed", call)));
        }
        Ok(())
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new(&MockApiConfig::default())
    }
}

#[async_trait]
impl FormApi for MockApi {
    async fn fetch_locations(&self) -> Result<Vec<String>, ApiError> {
        self.round_trip("getLocations").await?;
        Ok(self.locations.clone())
    }

    async fn check_name_available(&self, name: &str) -> Result<bool, ApiError> {
        self.checked.lock().push(name.to_string());
        self.round_trip("isNameValid").await?;

        let available = !self.taken.contains(&normalize(name));
        debug!(name, available, "Mock name check");
        Ok(available)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
