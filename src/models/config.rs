//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Job search provider settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Dedup cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Digest rendering settings
    #[serde(default)]
    pub digest: DigestConfig,

    /// Email delivery settings
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Recurring run settings
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Upper bound for `search.date_window_days`.
pub const MAX_DATE_WINDOW_DAYS: u32 = 3650;

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.search.query.trim().is_empty() {
            return Err(AppError::config("search.query is empty"));
        }
        if self.search.result_cap == 0 {
            return Err(AppError::config("search.result_cap must be > 0"));
        }
        if self.search.timeout_secs == 0 {
            return Err(AppError::config("search.timeout_secs must be > 0"));
        }
        if self
            .search
            .date_window_days
            .is_some_and(|days| days > MAX_DATE_WINDOW_DAYS)
        {
            return Err(AppError::config(format!(
                "search.date_window_days must be <= {MAX_DATE_WINDOW_DAYS}"
            )));
        }
        if self.cache.max_entries == 0 {
            return Err(AppError::config("cache.max_entries must be > 0"));
        }
        if self.cache.fallback_count > self.cache.max_entries {
            return Err(AppError::config(
                "cache.fallback_count must not exceed cache.max_entries",
            ));
        }
        if self.delivery.from.trim().is_empty() {
            return Err(AppError::config("delivery.from is empty"));
        }
        if self.delivery.timeout_secs == 0 {
            return Err(AppError::config("delivery.timeout_secs must be > 0"));
        }
        if self.delivery.provider == DeliveryProvider::Smtp && self.delivery.smtp.host.is_empty()
        {
            return Err(AppError::config("delivery.smtp.host is empty"));
        }
        Ok(())
    }
}

/// Job search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Free-text search query
    #[serde(default = "defaults::query")]
    pub query: String,

    /// SerpApi engine name
    #[serde(default = "defaults::engine")]
    pub engine: String,

    /// Provider base URL
    #[serde(default = "defaults::search_base_url")]
    pub base_url: String,

    /// Maximum postings kept from one fetch
    #[serde(default = "defaults::result_cap")]
    pub result_cap: usize,

    /// Restrict results to the last N days via an `after:` token
    #[serde(default)]
    pub date_window_days: Option<u32>,

    /// Location filter passed to the provider
    #[serde(default)]
    pub location: Option<String>,

    /// Interface language (`hl`)
    #[serde(default)]
    pub language: Option<String>,

    /// Country code (`gl`)
    #[serde(default)]
    pub country: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: defaults::query(),
            engine: defaults::engine(),
            base_url: defaults::search_base_url(),
            result_cap: defaults::result_cap(),
            date_window_days: None,
            location: None,
            language: None,
            country: None,
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Dedup cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Local cache file
    #[serde(default = "defaults::cache_path")]
    pub path: PathBuf,

    /// Maximum identifiers retained
    #[serde(default = "defaults::max_entries")]
    pub max_entries: usize,

    /// Postings re-sent when nothing new was found (0 disables)
    #[serde(default = "defaults::fallback_count")]
    pub fallback_count: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: defaults::cache_path(),
            max_entries: defaults::max_entries(),
            fallback_count: defaults::fallback_count(),
        }
    }
}

/// What to do when the provider returns no postings at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Do not send anything
    #[default]
    Skip,
    /// Send a "no jobs" digest
    Placeholder,
}

/// Digest rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Subject template; supports `{count}` and `{date}`
    #[serde(default = "defaults::subject")]
    pub subject: String,

    /// Heading shown above the list
    #[serde(default = "defaults::heading")]
    pub heading: String,

    /// Show the classified source platform per posting
    #[serde(default = "defaults::enabled")]
    pub show_platform: bool,

    /// Behavior when the fetch returns nothing
    #[serde(default)]
    pub empty_policy: EmptyPolicy,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            subject: defaults::subject(),
            heading: defaults::heading(),
            show_platform: true,
            empty_policy: EmptyPolicy::default(),
        }
    }
}

/// Email delivery backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryProvider {
    /// Resend HTTP API
    #[default]
    Resend,
    /// SMTP relay (requires the `smtp` feature)
    Smtp,
}

/// Email delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub provider: DeliveryProvider,

    /// Sender mailbox, e.g. `Daily Jobs <onboarding@resend.dev>`
    #[serde(default = "defaults::from")]
    pub from: String,

    /// Recipient; overridden by the `EMAIL` environment variable
    #[serde(default)]
    pub recipient: Option<String>,

    /// Resend API base URL
    #[serde(default = "defaults::delivery_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            provider: DeliveryProvider::default(),
            from: defaults::from(),
            recipient: None,
            base_url: defaults::delivery_base_url(),
            timeout_secs: defaults::timeout(),
            smtp: SmtpConfig::default(),
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "defaults::smtp_host")]
    pub host: String,

    #[serde(default = "defaults::smtp_port")]
    pub port: u16,

    /// Login name; defaults to the sender address when empty
    #[serde(default)]
    pub username: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: defaults::smtp_host(),
            port: defaults::smtp_port(),
            username: String::new(),
        }
    }
}

/// Recurring run settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Five-field cron expression, e.g. `0 9 * * *`
    #[serde(default)]
    pub expression: Option<String>,

    /// IANA timezone name, e.g. `Asia/Kolkata` (UTC when unset)
    #[serde(default)]
    pub timezone: Option<String>,
}

mod defaults {
    use std::path::PathBuf;

    // Search defaults
    pub fn query() -> String {
        "React OR MERN stack developer 4 years experience job India".into()
    }
    pub fn engine() -> String {
        "google_jobs".into()
    }
    pub fn search_base_url() -> String {
        "https://serpapi.com".into()
    }
    pub fn result_cap() -> usize {
        20
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; jobwatch/0.1)".into()
    }

    // Cache defaults
    pub fn cache_path() -> PathBuf {
        PathBuf::from("storage/seen_jobs.json")
    }
    pub fn max_entries() -> usize {
        300
    }
    pub fn fallback_count() -> usize {
        3
    }

    // Digest defaults
    pub fn subject() -> String {
        "Daily Job Updates ({count} jobs, {date})".into()
    }
    pub fn heading() -> String {
        "Today's Job Results".into()
    }
    pub fn enabled() -> bool {
        true
    }

    // Delivery defaults
    pub fn from() -> String {
        "Daily Jobs <onboarding@resend.dev>".into()
    }
    pub fn delivery_base_url() -> String {
        "https://api.resend.com".into()
    }
    pub fn smtp_host() -> String {
        "smtp.gmail.com".into()
    }
    pub fn smtp_port() -> u16 {
        587
    }
}
