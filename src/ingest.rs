//! File ingestion for uploaded test-data bundles.
//!
//! Uploaded files are stored content-addressed: the stored name is the
//! SHA-256 of the content, sharded into a 2-character prefix directory to
//! avoid oversized flat directories. Content addressing makes ingestion
//! idempotent — re-uploading the same bytes lands on the same name and
//! never silently overwrites another problem's file — which in turn makes
//! retrying an attach after a downstream publish failure safe.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Errors that can occur while ingesting an uploaded file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The upload contained no bytes.
    #[error("Upload is empty")]
    EmptyUpload,

    /// Filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage directory creation failed.
    #[error("Failed to create storage directory: {0}")]
    DirectoryCreationFailed(String),

    /// A stored file was requested but is not present.
    #[error("Stored file not found: {0}")]
    NotFound(String),
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Stable reference to the stored file, usable both for storage
    /// lookup and for inclusion in dispatch messages.
    pub name: String,
    /// Number of bytes written.
    pub bytes_len: u64,
    /// SHA-256 checksum of the content (hex).
    pub checksum: String,
}

/// Content-addressed file store for uploaded data bundles.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `base_path`. The directory is created
    /// lazily on first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the base storage path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Stores an uploaded byte stream and returns its stable reference.
    ///
    /// The full upload is already in memory by the time this is called, so
    /// the caller can embed the same bytes in a dispatch message without a
    /// second read. Storing identical content twice is a no-op beyond the
    /// existence check.
    pub async fn store(&self, data: &[u8]) -> Result<StoredFile, IngestError> {
        if data.is_empty() {
            return Err(IngestError::EmptyUpload);
        }

        let checksum = compute_checksum(data);
        let file_path = self.file_path(&checksum);

        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    IngestError::DirectoryCreationFailed(format!(
                        "Failed to create {:?}: {}",
                        parent, e
                    ))
                })?;
            }
        }

        // Identical content maps to an identical path; skip the rewrite.
        if !file_path.exists() {
            let mut file = fs::File::create(&file_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
        }

        tracing::debug!(
            name = %checksum,
            bytes = data.len(),
            "stored uploaded data file"
        );

        Ok(StoredFile {
            name: checksum.clone(),
            bytes_len: data.len() as u64,
            checksum,
        })
    }

    /// Reads back a stored file by its reference.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, IngestError> {
        let file_path = self.file_path(name);
        match fs::read(&file_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IngestError::NotFound(name.to_string()))
            }
            Err(e) => Err(IngestError::Io(e)),
        }
    }

    /// Returns the on-disk path for a stored name, sharded by the first
    /// two characters to keep directories small.
    fn file_path(&self, name: &str) -> PathBuf {
        let subdir = &name[0..2.min(name.len())];
        self.base_path.join(subdir).join(name)
    }
}

/// Computes the SHA-256 checksum of data as a hex string.
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
