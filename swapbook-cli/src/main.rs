//! Swapbook - browse engine swaps and keep a list of favorite cars
//!
//! Every command loads the configuration, then works against the
//! swapbook-core catalog, favorites store, and view controller.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use swapbook_core::catalog::clear_cache;
use swapbook_core::config::{SwapbookConfig, CONFIG_FILE};
use swapbook_core::ViewTab;

mod browse_cli;
mod favorite_cli;

/// Log levels
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "swapbook",
    about = "Browse engine swaps by brand or engine and keep favorites",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Log output format (logs always go to stderr)
    #[clap(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Override the origin serving engine_swap_database.json
    #[clap(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List cars grouped by brand
    Brands(browse_cli::ViewArgs),

    /// List cars grouped by swappable engine
    Engines(browse_cli::ViewArgs),

    /// List favorite cars grouped by brand
    Favorites(browse_cli::ViewArgs),

    /// Manage favorite cars
    Favorite {
        #[clap(subcommand)]
        command: favorite_cli::FavoriteCommand,
    },

    /// Manage the local catalog cache
    Cache {
        #[clap(subcommand)]
        command: CacheCommand,
    },

    /// Inspect configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Delete cached catalog downloads
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective configuration as YAML
    Show,
}

fn initialize_tracing(log_level: LogLevel, log_format: LogFormat) {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    match log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Load configuration, then apply command-line overrides
fn load_config(path: Option<&PathBuf>, base_url: Option<&str>) -> Result<SwapbookConfig> {
    let mut config = match path {
        Some(path) => SwapbookConfig::load_from_path(path),
        None => SwapbookConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(base_url) = base_url {
        config.base_url = base_url.to_string();
        config.validate()?;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.log_level, cli.log_format);

    let config = load_config(cli.config.as_ref(), cli.base_url.as_deref())?;
    tracing::debug!(base_url = %config.base_url, "Configuration loaded");

    match cli.command {
        Command::Brands(args) => browse_cli::execute(ViewTab::ByBrand, args, &config).await,
        Command::Engines(args) => browse_cli::execute(ViewTab::ByEngine, args, &config).await,
        Command::Favorites(args) => browse_cli::execute(ViewTab::Favorites, args, &config).await,
        Command::Favorite { command } => command.execute(&config).await,
        Command::Cache {
            command: CacheCommand::Clear,
        } => cache_clear_command(&config),
        Command::Config {
            command: ConfigCommand::Show,
        } => config_show_command(&config, cli.config.as_ref()),
    }
}

fn cache_clear_command(config: &SwapbookConfig) -> Result<()> {
    let cache_dir = config.cache_dir()?;
    let removed = clear_cache(&cache_dir)?;
    println!(
        "Removed {} cached catalog(s) from {}",
        removed,
        cache_dir.display()
    );
    Ok(())
}

fn config_show_command(config: &SwapbookConfig, path: Option<&PathBuf>) -> Result<()> {
    let source = match path {
        Some(path) => path.clone(),
        None => SwapbookConfig::config_dir()?.join(CONFIG_FILE),
    };

    println!("# Config file: {}", source.display());
    println!("# Favorites:   {}", config.favorites_path()?.display());
    println!("# Cache:       {}", config.cache_dir()?.display());
    print!("{}", config.to_yaml()?);
    Ok(())
}
