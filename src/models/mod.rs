// src/models/mod.rs

//! Domain models for the notifier.

mod config;
mod posting;

pub use config::{
    CacheConfig, Config, DeliveryConfig, DeliveryProvider, DigestConfig, EmptyPolicy,
    ScheduleConfig, SearchConfig, SmtpConfig,
};
pub use posting::Posting;
