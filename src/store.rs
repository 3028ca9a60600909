use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::models::SavedRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("saved record in {location} is corrupt: {detail}")]
    Corrupt { location: String, detail: String },
    #[error("failed to serialize saved record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Holds the single "last used" record between page views.
///
/// A missing record is `Ok(None)`; errors are reserved for storage that
/// exists but cannot be read or written.
pub trait RecordStore: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Option<SavedRecord>, StoreError>> + Send;

    fn save(&self, saved: &SavedRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    // Unique per write so concurrent saves never share a scratch file.
    fn scratch_path(&self) -> PathBuf {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let scratch = format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        );
        self.path.with_file_name(scratch)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordStore for FileStore {
    async fn load(&self) -> Result<Option<SavedRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                location: self.path.display().to_string(),
                detail: err.to_string(),
            })
    }

    async fn save(&self, saved: &SavedRecord) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(saved).map_err(StoreError::Encode)?;
        let scratch = self.scratch_path();
        tokio::fs::write(&scratch, body)
            .await
            .map_err(|err| self.io_error(err))?;
        if let Err(err) = tokio::fs::rename(&scratch, &self.path).await {
            let _ = tokio::fs::remove_file(&scratch).await;
            return Err(self.io_error(err));
        }
        tracing::debug!(path = %self.path.display(), "saved attendance record");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}
