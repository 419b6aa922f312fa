//! Blob store abstraction
//!
//! Defines the BlobStore trait and implementations for different storage systems:
//! - FileSystemBlobStore: containers are directories under a local root
//! - MemoryBlobStore: process-local map, used for tests and ephemeral runs
//! - HttpBlobStore: remote object service over HTTP (feature `api-backend`)
//!
//! Objects are addressed by container name + blob name. Every `put` replaces the
//! whole object; there is no append and no multi-object transaction.

use async_trait::async_trait;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Blob not found: {container}/{name}")]
    BlobNotFound { container: String, name: String },
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

impl StorageError {
    pub(crate) fn not_found(container: &str, name: &str) -> Self {
        StorageError::BlobNotFound {
            container: container.to_string(),
            name: name.to_string(),
        }
    }

    /// Whether this error means the requested object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::BlobNotFound { .. })
    }
}

/// Trait for blob stores
///
/// Handles are created once per process and shared behind an `Arc`; implementations
/// must be safe to call from concurrent requests.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download the full content of a blob. Fails with `BlobNotFound` if absent.
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Upload a blob, overwriting any existing object of the same name
    async fn put(&self, container: &str, name: &str, content: &[u8]) -> Result<(), StorageError>;

    /// List blob names in a container. A container that was never written is empty.
    async fn list(&self, container: &str) -> Result<Vec<String>, StorageError>;

    /// Check if a blob exists
    async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError>;
}

/// Reject container or blob names that could escape their namespace.
pub(crate) fn validate_segment(kind: &str, value: &str) -> Result<(), StorageError> {
    if value.is_empty() {
        return Err(StorageError::PermissionDenied(format!(
            "{kind} name cannot be empty"
        )));
    }

    if value.contains("..") || value.contains('/') || value.contains('\\') {
        return Err(StorageError::PermissionDenied(format!(
            "{kind} name contains path separators or traversal: {value}"
        )));
    }

    if value.starts_with('.') {
        return Err(StorageError::PermissionDenied(format!(
            "{kind} name cannot start with a period: {value}"
        )));
    }

    Ok(())
}

pub mod filesystem;
pub mod memory;

#[cfg(feature = "api-backend")]
pub mod api;
