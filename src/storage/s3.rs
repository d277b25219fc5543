//! AWS S3 storage implementation.
//!
//! Keeps the cache as a single JSON object, `s3://{bucket}/{key}`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::pipeline::dedup::{decode_entries, encode_entries};
use crate::storage::CacheStore;

/// S3-based cache backend.
#[derive(Clone)]
pub struct S3CacheStore {
    client: Client,
    bucket: String,
    key: String,
}

impl S3CacheStore {
    /// Create a new S3 cache store.
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create S3 storage from environment configuration.
    ///
    /// - `CACHE_S3_BUCKET` (default: `jobwatch`)
    /// - `CACHE_S3_KEY` (default: `cache/seen_jobs.json`)
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket = std::env::var("CACHE_S3_BUCKET").unwrap_or_else(|_| "jobwatch".to_string());
        let key =
            std::env::var("CACHE_S3_KEY").unwrap_or_else(|_| "cache/seen_jobs.json".to_string());

        Self::new(client, bucket, key)
    }

    /// Read the object, returning None if it doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output.body.collect().await.map_err(AppError::s3)?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(AppError::s3(service_err))
                }
            }
        }
    }
}

#[async_trait]
impl CacheStore for S3CacheStore {
    async fn load(&self) -> Vec<String> {
        match self.read_bytes().await {
            Ok(Some(bytes)) => decode_entries(&bytes).unwrap_or_else(|e| {
                log::warn!("{} at {}. Starting empty.", e, self.location());
                Vec::new()
            }),
            Ok(None) => {
                log::info!("No cache at {}, starting empty", self.location());
                Vec::new()
            }
            Err(e) => {
                log::warn!("Cache read failed at {}: {}. Starting empty.", self.location(), e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, entries: &[String]) -> Result<()> {
        let bytes = ByteStream::from(encode_entries(entries)?);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(bytes)
            .content_type("application/json")
            .send()
            .await
            .map_err(AppError::s3)?;

        log::info!("Persisted {} cached ids to {}", entries.len(), self.location());
        Ok(())
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}
