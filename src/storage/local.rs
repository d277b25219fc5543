//! Local filesystem storage implementation.
//!
//! Writes go to a sibling temp file first and are renamed into place, so
//! a crash mid-write leaves the previous cache intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::pipeline::dedup::{decode_entries, encode_entries};
use crate::storage::CacheStore;

/// Local filesystem cache backend.
#[derive(Debug, Clone)]
pub struct LocalCacheStore {
    path: PathBuf,
}

impl LocalCacheStore {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn load(&self) -> Vec<String> {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No cache at {}, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                log::warn!(
                    "Cache read failed at {}: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match decode_entries(&bytes) {
            Ok(entries) => {
                log::debug!(
                    "Loaded {} cached ids from {}",
                    entries.len(),
                    self.path.display()
                );
                entries
            }
            Err(e) => {
                log::warn!("{} at {}. Starting empty.", e, self.path.display());
                Vec::new()
            }
        }
    }

    async fn persist(&self, entries: &[String]) -> Result<()> {
        let bytes = encode_entries(entries)?;
        self.write_bytes(&bytes).await?;
        log::info!(
            "Persisted {} cached ids to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(tmp.path().join("seen_jobs.json"));

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("seen_jobs.json");
        std::fs::write(&path, "this is not json").unwrap();

        let store = LocalCacheStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("seen_jobs.json");
        std::fs::write(&path, r#"{"seen": ["a"]}"#).unwrap();

        let store = LocalCacheStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(tmp.path().join("nested/dir/seen_jobs.json"));

        let entries = vec!["https://g.co/1".to_string(), "Dev|Acme".to_string()];
        store.persist(&entries).await.unwrap();

        assert_eq!(store.load().await, entries);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_persist_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCacheStore::new(tmp.path().join("seen_jobs.json"));

        store.persist(&["a".to_string(), "b".to_string()]).await.unwrap();
        store.persist(&["c".to_string()]).await.unwrap();

        assert_eq!(store.load().await, vec!["c".to_string()]);
    }
}
