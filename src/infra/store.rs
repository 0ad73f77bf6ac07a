//! Durable holder of the toast collection: a single JSON document on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

use crate::domain::toasts::ToastCollection;

/// Errors raised by the storage medium. Display strings double as the
/// user-facing error text on the API boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not create data directory")]
    Unavailable(#[source] std::io::Error),
    #[error("Could not read data file")]
    Read(#[source] std::io::Error),
    #[error("Invalid data in file")]
    Corrupt(#[source] serde_json::Error),
    #[error("Could not save data to file")]
    Write(#[source] std::io::Error),
}

#[async_trait]
pub trait ToastStore: Send + Sync {
    /// Current collection; an absent document is the empty default, not an error.
    async fn read(&self) -> Result<ToastCollection, StoreError>;

    /// Atomic full overwrite. Last writer wins; there is no revision check.
    async fn replace(&self, collection: &ToastCollection) -> Result<(), StoreError>;
}

/// Filesystem-backed store keeping the collection pretty-printed at a fixed
/// path. Replacement writes a sibling temp file and renames it over the
/// document, so a concurrent read never observes a partial write.
#[derive(Debug)]
pub struct FileToastStore {
    path: PathBuf,
}

impl FileToastStore {
    /// Root the store at `path`, creating the parent directory if necessary.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Unavailable)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_owned()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ToastStore for FileToastStore {
    async fn read(&self) -> Result<ToastCollection, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ToastCollection::default());
            }
            Err(err) => return Err(StoreError::Read(err)),
        };
        serde_json::from_slice(&bytes).map_err(StoreError::Corrupt)
    }

    async fn replace(&self, collection: &ToastCollection) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(collection)
            .map_err(|err| StoreError::Write(err.into()))?;
        let staging = self.staging_path();
        fs::write(&staging, json).await.map_err(StoreError::Write)?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(StoreError::Write)
    }
}
