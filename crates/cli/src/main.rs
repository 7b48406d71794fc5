//! namecheck CLI - interactive name/location form

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

mod cmd;

/// namecheck - name form with debounced availability checks
#[derive(Parser)]
#[command(name = "namecheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/namecheck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive form (default)
    Run,
    /// Fetch and print the location list
    Locations,
    /// Check a single name without debouncing
    Check {
        /// Name to check
        name: String,
    },
    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; the guard flushes the log file on exit
    let _guard = init_tracing(cli.log_file.as_deref())?;

    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd::run::run(config_path).await,
        Commands::Locations => cmd::locations::run(config_path).await,
        Commands::Check { name } => cmd::check::run(config_path, &name).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(config_path).await,
            ConfigCommands::Path { create } => cmd::config::run_path(config_path, create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .context("Log file path has no file name")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_writer(writer)
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .init();
            Ok(Some(guard))
        }
        None => {
            // Keep stderr quiet enough for the interactive prompt
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_max_level(tracing::Level::WARN)
                .init();
            Ok(None)
        }
    }
}
