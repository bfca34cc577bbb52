//! Blob storage for uploaded covers and audio files.
//!
//! Blobs are opaque: the store never inspects their content. Records keep the
//! path relative to the store root, which is also the `/media/*path` URL.

mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Interface for blob storage backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Root directory of the store.
    fn root(&self) -> &Path;

    /// Writes `data` at the path relative to the root, creating parent
    /// directories as needed.
    async fn put(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Reads the blob at the path relative to the root.
    async fn get(&self, path: &Path) -> Result<Vec<u8>>;

    /// Deletes the blob at the path relative to the root.
    async fn delete(&self, path: &Path) -> Result<()>;
}

/// What an uploaded blob is, which decides its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Cover,
    Audio,
}

impl BlobKind {
    fn dir(self) -> &'static str {
        match self {
            BlobKind::Cover => "covers",
            BlobKind::Audio => "audio",
        }
    }
}

/// Fresh relative path for a new blob, keeping the upload's extension.
pub fn new_blob_path(kind: BlobKind, extension: &str) -> PathBuf {
    PathBuf::from(kind.dir()).join(format!("{}.{}", uuid::Uuid::new_v4(), extension))
}

/// Deletes blobs left behind by removed records. Failures are only logged.
pub async fn release_blobs(store: &dyn BlobStore, paths: &[String]) {
    for path in paths {
        match store.delete(Path::new(path)).await {
            Ok(()) => tracing::debug!(path = %path, "Released blob"),
            Err(e) => tracing::warn!(path = %path, error = %e, "Failed to release blob"),
        }
    }
}
