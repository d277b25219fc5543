//! jobwatch CLI
//!
//! Local execution entry point. For AWS Lambda, use `jobwatch-lambda`.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use jobwatch::{
    config::{self, Credentials},
    error::Result,
    models::Config,
    pipeline::{self, CycleOptions, Driver},
    services::{SerpApiFetcher, build_notifier},
    storage::{CacheStore, LocalCacheStore},
};

/// Cache entries listed by `info`, newest first.
const RECENT_IDS_SHOWN: usize = 5;

/// jobwatch - Daily job search digest
#[derive(Parser, Debug)]
#[command(
    name = "jobwatch",
    version,
    about = "Searches for job postings and emails a deduplicated digest"
)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single cycle now
    Run {
        /// Fetch and render only; print the digest instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Run cycles on the configured cron schedule until interrupted
    Schedule,

    /// Validate configuration and credentials
    Validate,

    /// Show configuration and cache info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_driver(config: &Config, credentials: &Credentials) -> Result<Driver> {
    let fetcher = SerpApiFetcher::new(&config.search, &credentials.search_api_key)?;
    let notifier = build_notifier(&config.delivery, credentials)?;
    let store = LocalCacheStore::new(&config.cache.path);

    Ok(Driver::new(
        CycleOptions::from_config(config, credentials),
        Box::new(fetcher),
        notifier,
        Box::new(store),
    ))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("jobwatch starting...");

    match cli.command {
        Command::Run { dry_run } => {
            let (config, credentials) = config::load_all(&cli.config)?;
            let driver = build_driver(&config, &credentials)?;

            if dry_run {
                let preview = driver.preview().await?;
                log::info!(
                    "Dry run: {} fetched, {} selected{}",
                    preview.fetched,
                    preview.selection.postings.len(),
                    if preview.selection.fallback { " (fallback)" } else { "" }
                );
                println!("Subject: {}\n", preview.digest.subject);
                println!("{}", preview.digest.html);
                return Ok(());
            }

            // A failed cycle is logged by the driver; the next run retries.
            let report = driver.run_cycle().await;
            log::info!("Cycle finished: {}", report.state);
        }

        Command::Schedule => {
            let (config, credentials) = config::load_all(&cli.config)?;
            let (schedule, tz) = pipeline::schedule::resolve(&config.schedule)?;
            let driver = build_driver(&config, &credentials)?;

            pipeline::run_schedule(&driver, &schedule, tz).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let (config, credentials) = match config::load_all(&cli.config) {
                Ok(loaded) => loaded,
                Err(e) => {
                    log::error!("Config validation failed: {}", e);
                    return Err(e);
                }
            };
            log::info!("✓ Config OK ({})", cli.config.display());
            log::info!("✓ Credentials OK (recipient {})", credentials.recipient);

            if config.schedule.expression.is_some() {
                let (schedule, tz) = pipeline::schedule::resolve(&config.schedule)?;
                log::info!("✓ Schedule OK (\"{}\" in {})", schedule.expression(), tz);
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            let config = Config::load_or_default(&cli.config);

            log::info!(
                "Config file: {} ({})",
                cli.config.display(),
                if cli.config.exists() { "exists" } else { "not found, using defaults" }
            );
            log::info!("Query: \"{}\"", config.search.query);
            log::info!(
                "Date window: {}",
                match config.search.date_window_days {
                    Some(days) => format!("{days} day(s)"),
                    None => "off".to_string(),
                }
            );

            let store = LocalCacheStore::new(&config.cache.path);
            let entries = store.load().await;
            log::info!(
                "Cache: {} ({} of {} ids)",
                store.location(),
                entries.len(),
                config.cache.max_entries
            );

            for id in entries.iter().rev().take(RECENT_IDS_SHOWN) {
                log::info!("  {}", id);
            }

            if config.schedule.expression.is_some() {
                let (schedule, tz) = pipeline::schedule::resolve(&config.schedule)?;
                match schedule.next_after(Utc::now(), tz) {
                    Some(next) => log::info!(
                        "Schedule: \"{}\", next at {}",
                        schedule.expression(),
                        next.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z")
                    ),
                    None => log::info!("Schedule: \"{}\" never fires", schedule.expression()),
                }
            } else {
                log::info!("Schedule: not configured");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
