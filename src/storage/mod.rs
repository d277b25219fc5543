//! Storage abstractions for the dedup cache.
//!
//! The cache is one artifact holding a JSON array of posting identifiers:
//!
//! ```text
//! storage/
//! ├── config.toml           # Notifier configuration
//! └── seen_jobs.json        # ["https://...", "Title|Company", ...]
//! ```
//!
//! Loading never fails: an absent or malformed artifact is an empty cache.

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalCacheStore;
#[cfg(feature = "s3")]
pub use s3::S3CacheStore;

/// Trait for cache storage backends.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read persisted identifiers, oldest first.
    ///
    /// Returns an empty list when storage is absent or unreadable.
    async fn load(&self) -> Vec<String>;

    /// Overwrite storage with `entries`.
    async fn persist(&self, entries: &[String]) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
