//! Configuration commands
//!
//! Show the effective configuration, its location, and an example file.

use anyhow::{Context, Result};
use cli_lib::system_config;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

fn resolve_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(p) => Ok(p.to_path_buf()),
        None => system_config::config_file_path().context("Could not determine config file path"),
    }
}

/// List all configuration values
pub async fn run_list(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load(config_path)?;
    let path = resolve_path(config_path)?;

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), path.display().dimmed());

    println!("{}", "[debounce]".yellow());
    println!(
        "  {} = {} {}",
        "delay_ms".cyan(),
        config.debounce.delay_ms,
        format!("({}ms quiet period before checking)", config.debounce.delay_ms).dimmed()
    );

    println!("\n{}", "[api]".yellow());
    println!("  {} = {}", "latency_ms".cyan(), config.api.latency_ms);
    println!("  {} = {:?}", "locations".cyan(), config.api.locations);
    println!("  {} = {:?}", "taken_names".cyan(), config.api.taken_names);

    println!("\n{}", "[repl]".yellow());
    println!("  {} = {}", "keystroke_ms".cyan(), config.repl.keystroke_ms);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  delay_ms: 0-10000");
    println!("  latency_ms: 0-10000");
    println!("  keystroke_ms: 0-2000");

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(config_path: Option<&Path>, create: bool) -> Result<()> {
    let path = resolve_path(config_path)?;

    if create && system_config::init_if_missing(&path)? {
        println!("{} Created config file at: {}", "✓".green(), path.display());
    } else {
        println!("{}", path.display());
        if !path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}
