//! pisense: Sense HAT environmental poller
//!
//! Reads the HTS221 over I2C, turns raw counts into calibrated temperature and
//! humidity, and prints one JSON record per sample on stdout. Logs go to stderr.
//!
//! Modes:
//! - default: poll on a fixed interval until SIGINT/SIGTERM/SIGHUP/SIGQUIT
//! - --once: one sample, no logging
//! - verify: check every chip's WHO_AM_I register
//! - config: edit the config file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// === Modules ===

mod app;
mod config;
mod i2c;
mod logger;
mod sensors;
mod shutdown;
mod timer;

use config::Config;
use shutdown::Shutdown;

// === CLI ===

#[derive(Parser)]
#[command(name = "pisense")]
#[command(about = "Calibrated Sense HAT temperature and humidity as JSON", version)]
struct Cli {
    /// Config file (default: ~/.config/pisense/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Take a single sample, print it and exit
    #[arg(long)]
    once: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every chip's identity register and exit
    Verify,
    /// Open the config file in your editor, creating it if needed
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => run_config_command(cli.config.as_deref()),
        Some(Commands::Verify) => {
            let (path, config) = load_config(cli.config.as_deref())?;
            init_tracing(configured_filter(&config.logger.level));
            tracing::info!("Loaded config from {:?}", path);
            app::run_verify(&config)
        }
        None if cli.once => {
            let (_, config) = load_config(cli.config.as_deref())?;
            init_tracing(EnvFilter::new("off"));
            app::run_once(&config)
        }
        None => {
            let (path, config) = load_config(cli.config.as_deref())?;
            init_tracing(configured_filter(&config.logger.level));
            tracing::info!("Loaded config from {:?}", path);

            if config.debug.print_config_on_startup {
                tracing::info!("Configuration:\n{}", config.to_toml()?);
            }

            let shutdown = Shutdown::new();
            shutdown::listen_for_signals(Arc::clone(&shutdown))
                .context("Failed to install signal handlers")?;

            app::run_polling(config, shutdown).await
        }
    }
}

/// RUST_LOG wins over the configured level
fn configured_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn init_tracing(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<(PathBuf, Config)> {
    let path = Config::resolve_path(explicit)?;
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok((path, config))
}

/// Open config file in user's editor
fn run_config_command(explicit: Option<&Path>) -> anyhow::Result<()> {
    let config_path = Config::resolve_path(explicit)?;

    // Create config dir if needed
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create config file from template if it doesn't exist
    if !config_path.exists() {
        std::fs::write(&config_path, config::TEMPLATE)?;
        println!("Created config file: {}", config_path.display());
    }

    // Get editor from environment or use defaults
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "nano".to_string());

    println!("Opening {} with {}", config_path.display(), editor);

    let status = std::process::Command::new(&editor)
        .arg(&config_path)
        .status()
        .with_context(|| format!("Failed to launch {}", editor))?;

    if !status.success() {
        anyhow::bail!("{} exited with {}", editor, status);
    }

    // Catch mistakes while the user is still looking at the file
    Config::load(&config_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_once_with_config() {
        let cli = Cli::parse_from(["pisense", "--once", "-c", "/tmp/p.toml"]);
        assert!(cli.once);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_verify_subcommand() {
        let cli = Cli::parse_from(["pisense", "verify", "--config", "/tmp/p.toml"]);
        assert!(matches!(cli.command, Some(Commands::Verify)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
    }
}
