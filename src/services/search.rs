// src/services/search.rs

//! Job search service.
//!
//! Queries SerpApi's Google Jobs engine and normalizes the results into
//! [`Posting`]s.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Posting, SearchConfig};
use crate::utils::http::{create_client, snippet};

/// Provider message meaning "zero matches"; not a failure.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

/// Source of job postings.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Search for `query`, optionally restricted to postings after `since`.
    async fn fetch(&self, query: &str, since: Option<NaiveDate>) -> Result<Vec<Posting>>;
}

/// Append the `after:` date token when a window is set.
pub fn build_query(query: &str, since: Option<NaiveDate>) -> String {
    match since {
        Some(date) => format!("{} after:{}", query.trim(), date.format("%Y-%m-%d")),
        None => query.trim().to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    jobs_results: Vec<JobResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    share_link: Option<String>,
    #[serde(default)]
    apply_options: Vec<ApplyOption>,
    #[serde(default)]
    detected_extensions: Option<DetectedExtensions>,
}

#[derive(Debug, Deserialize)]
struct ApplyOption {
    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetectedExtensions {
    #[serde(default)]
    posted_at: Option<String>,
}

impl From<JobResult> for Posting {
    fn from(job: JobResult) -> Self {
        Self {
            title: job.title.trim().to_string(),
            company_name: job.company_name.trim().to_string(),
            location: job.location,
            posted_at: job.detected_extensions.and_then(|ext| ext.posted_at),
            apply_url: job.apply_options.into_iter().find_map(|opt| opt.link),
            share_url: job.share_link,
        }
    }
}

/// SerpApi-backed fetcher.
pub struct SerpApiFetcher {
    config: SearchConfig,
    api_key: String,
    client: Client,
}

impl SerpApiFetcher {
    /// Create a fetcher with its own HTTP client.
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = create_client(&config.user_agent, config.timeout_secs)?;
        Ok(Self {
            config: config.clone(),
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/search.json", self.config.base_url.trim_end_matches('/'))
    }

    fn params(&self, query: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", self.config.engine.clone()),
            ("q", query.to_string()),
            ("api_key", self.api_key.clone()),
        ];
        if let Some(location) = &self.config.location {
            params.push(("location", location.clone()));
        }
        if let Some(language) = &self.config.language {
            params.push(("hl", language.clone()));
        }
        if let Some(country) = &self.config.country {
            params.push(("gl", country.clone()));
        }
        params
    }

    fn parse(&self, body: &str) -> Result<Vec<Posting>> {
        let response: SearchResponse = serde_json::from_str(body)
            .map_err(|e| AppError::fetch(format!("unreadable provider response: {e}")))?;

        if let Some(message) = response.error {
            if message.contains(NO_RESULTS_MARKER) {
                return Ok(Vec::new());
            }
            return Err(AppError::fetch(format!("provider error: {message}")));
        }

        Ok(response
            .jobs_results
            .into_iter()
            .map(Posting::from)
            .filter(|p| !p.title.is_empty())
            .take(self.config.result_cap)
            .collect())
    }
}

#[async_trait]
impl Fetcher for SerpApiFetcher {
    async fn fetch(&self, query: &str, since: Option<NaiveDate>) -> Result<Vec<Posting>> {
        let query = build_query(query, since);
        log::info!("Searching jobs: \"{}\"", query);

        let response = self
            .client
            .get(self.endpoint())
            .query(&self.params(&query))
            .send()
            .await
            .map_err(|e| AppError::fetch(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(format!("reading response failed: {e}")))?;

        if !status.is_success() {
            return Err(AppError::fetch(format!(
                "provider returned {}: {}",
                status,
                snippet(&body)
            )));
        }

        let postings = self.parse(&body)?;
        log::info!("Found {} jobs", postings.len());
        Ok(postings)
    }
}
