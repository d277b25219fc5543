// src/error.rs

//! Unified error handling for the notifier.

use std::fmt;

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Job search provider failed or returned an unusable response
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Email delivery failed
    #[error("Delivery error: {message}")]
    Delivery { message: String },

    /// Persisted cache content could not be decoded
    #[error("Malformed cache: {0}")]
    MalformedCache(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid cron expression or timezone
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AppError {
    /// Create a fetch error.
    pub fn fetch(message: impl fmt::Display) -> Self {
        Self::Fetch {
            message: message.to_string(),
        }
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery {
            message: message.to_string(),
        }
    }

    /// Create a malformed cache error.
    pub fn malformed_cache(message: impl fmt::Display) -> Self {
        Self::MalformedCache(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a schedule error.
    pub fn schedule(message: impl Into<String>) -> Self {
        Self::Schedule(message.into())
    }

    /// Create an S3 error.
    pub fn s3(message: impl fmt::Display) -> Self {
        Self::S3(message.to_string())
    }
}
