// src/lambda/mod.rs

//! AWS Lambda handler for the notifier.
//!
//! Each invocation (typically from an EventBridge schedule) runs one cycle:
//! the cache lives in S3, configuration comes from a bundled TOML file plus
//! environment overrides.

use std::path::Path;

use lambda_runtime::{Error as LambdaError, LambdaEvent};

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Credentials;
use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::{CycleOptions, CycleReport, Driver};
use crate::services::{SerpApiFetcher, build_notifier};
use crate::storage::S3CacheStore;

const CONFIG_PATH_VAR: &str = "JOBWATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "storage/config.toml";

/// Lambda invocation payload.
#[derive(Debug, Default, Deserialize)]
pub struct CycleRequest {
    /// Render the digest without sending it or touching the cache
    #[serde(default)]
    pub dry_run: bool,
}

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct CycleResponse {
    /// Whether the cycle reached `done`
    pub success: bool,

    /// Terminal state, or the failed phase
    pub state: String,

    /// Number of postings returned by the search
    pub fetched: usize,

    /// Number of postings in the sent digest
    pub notified: usize,

    /// Whether already-notified postings were re-sent
    pub fallback_used: bool,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl From<&CycleReport> for CycleResponse {
    fn from(report: &CycleReport) -> Self {
        Self {
            success: report.is_success(),
            state: report
                .failed_phase
                .map(|phase| format!("failed:{phase}"))
                .unwrap_or_else(|| report.state.to_string()),
            fetched: report.fetched,
            notified: report.notified.len(),
            fallback_used: report.fallback_used,
            error: report.error.clone(),
            execution_time_ms: 0,
        }
    }
}

/// Main Lambda handler function. Always returns `Ok`; failures are in the body.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<CycleRequest>,
) -> std::result::Result<CycleResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!("Starting cycle: dry_run={}", request.dry_run);

    let mut response = match run(&request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Cycle setup failed: {}", e);
            CycleResponse {
                state: "failed".to_string(),
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };

    response.execution_time_ms = start.elapsed().as_millis() as u64;
    info!(
        "Cycle {}: {} fetched, {} notified in {}ms",
        response.state, response.fetched, response.notified, response.execution_time_ms
    );
    Ok(response)
}

async fn run(request: &CycleRequest) -> Result<CycleResponse> {
    let config = load_lambda_config(|name| std::env::var(name).ok())?;
    let credentials = Credentials::from_env(&config.delivery)?;

    let store = S3CacheStore::from_env().await;
    let driver = Driver::new(
        CycleOptions::from_config(&config, &credentials),
        Box::new(SerpApiFetcher::new(&config.search, &credentials.search_api_key)?),
        build_notifier(&config.delivery, &credentials)?,
        Box::new(store),
    );

    if request.dry_run {
        let preview = driver.preview().await?;
        info!("Dry run subject: {}", preview.digest.subject);
        return Ok(CycleResponse {
            success: true,
            state: "preview".to_string(),
            fetched: preview.fetched,
            notified: 0,
            fallback_used: preview.selection.fallback,
            ..Default::default()
        });
    }

    let report = driver.run_cycle().await;
    Ok(CycleResponse::from(&report))
}

/// Load the bundled config file, then apply environment overrides.
fn load_lambda_config<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let path = lookup(CONFIG_PATH_VAR).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = if Path::new(&path).exists() {
        Config::load(&path)?
    } else {
        info!("No config at {}, using defaults", path);
        Config::default()
    };

    if let Some(query) = lookup("SEARCH_QUERY").filter(|q| !q.trim().is_empty()) {
        config.search.query = query;
    }
    if let Some(cap) = lookup("RESULT_CAP") {
        config.search.result_cap = parse_override("RESULT_CAP", &cap)?;
    }
    if let Some(days) = lookup("DATE_WINDOW_DAYS") {
        config.search.date_window_days = match days.trim() {
            "" | "0" => None,
            value => Some(parse_override("DATE_WINDOW_DAYS", value)?),
        };
    }
    if let Some(count) = lookup("FALLBACK_COUNT") {
        config.cache.fallback_count = parse_override("FALLBACK_COUNT", &count)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{name}='{value}' is not a valid number")))
}
