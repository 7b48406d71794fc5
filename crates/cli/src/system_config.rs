//! User configuration (`config.toml`)
//!
//! Looked up at `$XDG_CONFIG_HOME/namecheck/config.toml` unless a path is
//! given explicitly. A missing file means defaults.

use anyhow::{Context, Result};
use debounce::DebounceConfig;
use form::MockApiConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub debounce: DebounceConfig,

    #[serde(default)]
    pub api: MockApiConfig,

    #[serde(default)]
    pub repl: ReplConfig,
}

/// Interactive session settings (`[repl]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Gap between simulated keystrokes for `type` (default: 80ms)
    #[serde(default = "default_keystroke_ms")]
    pub keystroke_ms: u64,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            keystroke_ms: default_keystroke_ms(),
        }
    }
}

fn default_keystroke_ms() -> u64 {
    80
}

impl SystemConfig {
    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.debounce.validate()?;
        self.api.validate()?;
        if self.repl.keystroke_ms > 2_000 {
            anyhow::bail!(
                "repl.keystroke_ms must be between 0 and 2000 (got {})",
                self.repl.keystroke_ms
            );
        }
        Ok(())
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("namecheck").join("config.toml"))
}

/// Load configuration from `path`, or from the default location
pub fn load(path: Option<&Path>) -> Result<SystemConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_file_path() {
            Some(p) => p,
            None => {
                tracing::debug!("No config directory on this platform, using defaults");
                return Ok(SystemConfig::default());
            }
        },
    };

    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(SystemConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok(config)
}

/// Write configuration to `path`, creating parent directories
pub fn save(config: &SystemConfig, path: &Path) -> Result<()> {
    config.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let serialized = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, serialized)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Create the config file with defaults if it does not exist yet
///
/// Returns true if a file was written.
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save(&SystemConfig::default(), path)?;
    Ok(true)
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# namecheck configuration

[debounce]
# Quiet period before a typed name is validated (0-10000)
delay_ms = 300

[api]
# Simulated latency of the mock API (0-10000)
latency_ms = 250
locations = ["Canada", "China", "USA", "Brazil"]
# Names the mock reports as taken (case-insensitive)
taken_names = ["invalid name"]

[repl]
# Gap between simulated keystrokes for `type` (0-2000)
keystroke_ms = 80
"#
}
