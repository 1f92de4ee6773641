//! Blob Store
//!
//! Content storage for uploaded files, decoupled from the record store. Keys
//! are opaque to callers; the filesystem implementation mints UUID-based
//! names that keep the original extension so the ingest layer can still
//! dispatch on it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::types::{InsightError, Result};

/// Async byte storage keyed by opaque identifiers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the key to read them back.
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String>;

    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Filesystem-backed blob store rooted at a single directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys are single path components; anything else is a caller bug or
        // a traversal attempt.
        if key.contains('/') || key.contains('\\') || key == "." || key == ".." {
            return Err(InsightError::storage(format!("invalid blob key: {key}")));
        }
        Ok(self.root.join(key))
    }

    fn mint_key(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        format!("{}.{}", Uuid::new_v4(), ext.to_lowercase())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.root).await?;
        let key = Self::mint_key(original_name);
        let path = self.path_for(&key)?;
        fs::write(&path, bytes).await?;
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(InsightError::BlobNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
