//! Local filesystem blob store.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};

use super::BlobStore;

/// Stores blobs under a directory on the local filesystem.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolves a relative path against the root, refusing anything that
    /// could land outside it (`..`, absolute paths, escaping symlinks).
    async fn validate_path(&self, path: &Path) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(AppError::BadRequest("Empty media path".to_string()));
        }

        let mut current = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    current.push(part);
                    if let Ok(metadata) = tokio::fs::symlink_metadata(&current).await {
                        if metadata.is_symlink() {
                            self.ensure_inside_root(&current).await?;
                        }
                    }
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(AppError::BadRequest(
                        "Path cannot contain parent directory references (..)".to_string(),
                    ));
                }
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "Invalid path component: {:?}",
                        component
                    )));
                }
            }
        }

        Ok(self.root.join(path))
    }

    async fn ensure_inside_root(&self, link: &Path) -> Result<()> {
        let Ok(resolved) = tokio::fs::canonicalize(link).await else {
            // Dangling link: nothing readable behind it.
            return Ok(());
        };
        let canonical_root = tokio::fs::canonicalize(&self.root).await?;
        if resolved.starts_with(&canonical_root) {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "Path contains symlink escaping media root".to_string(),
            ))
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn put(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.validate_path(path).await?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, data).await?;

        tracing::debug!(path = ?full_path, bytes = data.len(), "Blob written");
        Ok(())
    }

    async fn get(&self, path: &Path) -> Result<Vec<u8>> {
        let full_path = self.validate_path(path).await?;

        match tokio::fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Media file not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let full_path = self.validate_path(path).await?;

        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!(path = ?full_path, "Blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Media file not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
