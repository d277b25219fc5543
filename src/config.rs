// src/config.rs

//! Configuration loading utilities.
//!
//! Non-secret settings come from `config.toml`; credentials come only from
//! the environment and are checked once, at startup.

use std::fmt;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, DeliveryConfig, DeliveryProvider};

pub const SEARCH_API_KEY_VAR: &str = "SERP_API_KEY";
pub const RESEND_API_KEY_VAR: &str = "RESEND_API_KEY";
pub const SMTP_PASSWORD_VAR: &str = "SMTP_PASSWORD";
pub const RECIPIENT_VAR: &str = "EMAIL";

/// Secrets and the recipient address.
#[derive(Clone)]
pub struct Credentials {
    pub search_api_key: String,
    pub delivery_api_key: String,
    pub recipient: String,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env(delivery: &DeliveryConfig) -> Result<Self> {
        Self::from_lookup(delivery, |name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup.
    pub fn from_lookup<F>(delivery: &DeliveryConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let search_api_key = get(SEARCH_API_KEY_VAR)
            .ok_or_else(|| AppError::config(format!("{SEARCH_API_KEY_VAR} is not set")))?;

        let delivery_var = match delivery.provider {
            DeliveryProvider::Resend => RESEND_API_KEY_VAR,
            DeliveryProvider::Smtp => SMTP_PASSWORD_VAR,
        };
        let delivery_api_key = get(delivery_var)
            .ok_or_else(|| AppError::config(format!("{delivery_var} is not set")))?;

        let recipient = get(RECIPIENT_VAR)
            .or_else(|| delivery.recipient.clone().filter(|r| !r.trim().is_empty()))
            .ok_or_else(|| {
                AppError::config(format!(
                    "No recipient: set {RECIPIENT_VAR} or delivery.recipient"
                ))
            })?;

        if !recipient.contains('@') {
            return Err(AppError::config(format!(
                "Recipient '{recipient}' is not an email address"
            )));
        }

        Ok(Self {
            search_api_key,
            delivery_api_key,
            recipient,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("search_api_key", &"<redacted>")
            .field("delivery_api_key", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Load the config file (defaults when absent), validate it, then resolve
/// credentials from the environment.
///
/// A config file that exists but does not parse is an error.
pub fn load_all(config_path: &Path) -> Result<(Config, Credentials)> {
    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        log::info!(
            "No config at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };
    config.validate()?;

    let credentials = Credentials::from_env(&config.delivery)?;
    Ok((config, credentials))
}
