//! exposure-watch CLI
//!
//! Invoked periodically by an external scheduler; each invocation is one
//! complete run. Exit codes: 0 success, 1 configuration/storage error,
//! 2 fetch failure, 3 critical delivery failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use exposure_watch::{
    models::{Config, SourceId},
    pipeline,
    store::HistoryStore,
};

/// exposure-watch - COVID exposure-site change watcher
#[derive(Parser, Debug)]
#[command(
    name = "exposure-watch",
    version,
    about = "Watches exposure-site listings and alerts on new entries"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch all sources, compute deltas, notify, persist
    Run {
        /// Compute and persist deltas but log the report instead of sending
        #[arg(long)]
        no_send: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show history store row counts per source
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config from {}: {}", cli.config.display(), e);
            return ExitCode::from(1);
        }
    };

    match cli.command {
        Command::Run { no_send } => {
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return ExitCode::from(1);
            }

            log::info!("Starting run against {} source(s)", config.sources.len());
            match pipeline::run(&config, no_send).await {
                Ok(report) => {
                    log::info!(
                        "Run complete: {} record(s) notified across {} source(s)",
                        report.notified,
                        report.stats.len()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!("Run failed: {e}");
                    ExitCode::from(e.exit_code())
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return ExitCode::from(1);
            }
            log::info!(
                "Config OK: {} source(s), channels configured: {}",
                config.sources.len(),
                !config.channels.is_empty()
            );
            ExitCode::SUCCESS
        }

        Command::Info => {
            let store = match HistoryStore::open(&config.database) {
                Ok(store) => store,
                Err(e) => {
                    log::error!("Cannot open history store: {e}");
                    return ExitCode::from(1);
                }
            };

            log::info!("History store: {}", config.database.display());
            for source in SourceId::ALL {
                match (store.count(source), store.latest_seen(source)) {
                    (Ok(count), Ok(latest)) => {
                        let latest = latest
                            .map(|ts| ts.to_string())
                            .unwrap_or_else(|| "never".to_string());
                        log::info!("  {source}: {count} row(s), last seen {latest}");
                    }
                    (Err(e), _) | (_, Err(e)) => {
                        log::error!("  {source}: {e}");
                        return ExitCode::from(1);
                    }
                }
            }
            ExitCode::SUCCESS
        }
    }
}
