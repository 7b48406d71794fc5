//! One-shot name availability check

use anyhow::{Context, Result};
use cli_lib::system_config;
use form::{FormApi, MockApi};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Name must not be empty");
    }

    let config = system_config::load(config_path)?;
    let api = MockApi::new(&config.api);

    let spinner = super::spinner("Checking name...")?;
    let available = api.check_name_available(name).await;
    spinner.finish_and_clear();

    if available.context("Failed to check name")? {
        println!("{} '{}' is available", "✓".green(), name);
    } else {
        println!("{} '{}' has already been taken", "✗".red(), name);
    }
    Ok(())
}
