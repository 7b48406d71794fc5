//! Print the location list

use anyhow::{Context, Result};
use cli_lib::system_config;
use form::{FormApi, MockApi};
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load(config_path)?;
    let api = MockApi::new(&config.api);

    let spinner = super::spinner("Fetching locations...")?;
    let locations = api.fetch_locations().await;
    spinner.finish_and_clear();

    let locations = locations.context("Failed to fetch locations")?;
    print!("{}", cli_lib::util::render_locations(&locations, None));
    Ok(())
}
