//! Listing Watcher CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use listing_watcher::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, RunMode, Watcher},
    storage::SeenStore,
};

/// Listing Watcher - exchange announcement alerts
#[derive(Parser, Debug)]
#[command(
    name = "listing-watcher",
    version,
    about = "Watches exchange announcements and pushes new listings to a chat"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "watcher.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll forever at the configured interval
    Run,

    /// Run a single cycle and exit
    Once,

    /// Send a test message to the configured chat
    TestNotify,

    /// Validate configuration
    Validate,

    /// Show configured sources and seen-store status
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the config file, then layer environment overrides on top.
fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            return Err(e);
        }
    };

    match cli.command {
        Command::Run => {
            let mut watcher = Watcher::from_config(config).await?;
            let (trigger, shutdown) = pipeline::shutdown_channel();
            let listener = pipeline::listen_for_ctrl_c(trigger);

            let outcome = watcher.run(RunMode::Forever, shutdown).await;
            listener.abort();
            outcome?;
        }

        Command::Once => {
            let mut watcher = Watcher::from_config(config).await?;
            let (_trigger, shutdown) = pipeline::shutdown_channel();
            watcher.run(RunMode::Once, shutdown).await?;
        }

        Command::TestNotify => {
            let mut watcher = Watcher::from_config(config).await?;
            if watcher.test_notify().await {
                log::info!("Test message delivered");
            } else {
                return Err(AppError::transport("test message was not delivered"));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!("✓ Config OK ({} source(s))", config.sources.len());

            match config.validate_notifier() {
                Ok(()) => log::info!("✓ Chat destination configured"),
                Err(e) => log::warn!("{}", e),
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!(
                "Interval: {}s, stop on first match: {}",
                config.watcher.interval_secs,
                config.watcher.stop_on_first_match
            );
            for source in &config.sources {
                log::info!("Source {} [{}]: {}", source.name, source.tag(), source.url);
            }

            let store = SeenStore::load(&config.store.path, config.store.id_normalization).await?;
            log::info!(
                "Seen-store {}: {} id(s)",
                store.path().display(),
                store.len()
            );
        }
    }

    Ok(())
}
