//! Interactive form session

use anyhow::{Context, Result};
use cli_lib::{system_config, Outcome, ReplCommand, Session};
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    // 1. Load configuration
    let config = system_config::load(config_path)?;

    // 2. Build the form and fetch locations
    let session = Session::new(&config)?;
    let spinner = super::spinner("Loading locations...")?;
    let locations = session.load_locations().await;
    spinner.finish_and_clear();
    let locations = locations?;

    println!("{}", "namecheck".bold());
    println!(
        "{} locations loaded, debounce {}ms. Type {} for commands.\n",
        locations.len(),
        config.debounce.delay_ms,
        "help".cyan()
    );

    // 3. Read commands until EOF, quit, or Ctrl-C
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match line.parse::<ReplCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                continue;
            }
        };

        match session.execute(command).await? {
            Outcome::Continue(text) => print!("{}", text),
            Outcome::Quit => break,
        }
    }

    session.shutdown();
    tracing::debug!("Session ended");
    Ok(())
}
