//! File system blob store
//!
//! Implements BlobStore on a local directory tree: each container is a
//! sub-directory of the root and each blob a file inside it.
//!
//! ## Security
//!
//! Container and blob names are validated as single path segments, and all
//! resolved paths are verified to remain within the root directory.

use super::{BlobStore, StorageError, validate_segment};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File system blob store
pub struct FileSystemBlobStore {
    root: PathBuf,
}

impl FileSystemBlobStore {
    /// Create a new file system blob store
    ///
    /// # Example
    ///
    /// ```rust
    /// use nutrition_insights::storage::filesystem::FileSystemBlobStore;
    ///
    /// let store = FileSystemBlobStore::new("/var/lib/nutrition");
    /// ```
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn container_path(&self, container: &str) -> Result<PathBuf, StorageError> {
        validate_segment("Container", container)?;
        Ok(self.root.join(container))
    }

    /// Resolve a blob path with security checks.
    fn blob_path(&self, container: &str, name: &str) -> Result<PathBuf, StorageError> {
        validate_segment("Blob", name)?;
        let full = self.container_path(container)?.join(name);

        // Existing paths may be symlinks; make sure they stay under the root
        if full.exists() {
            let canonical = full
                .canonicalize()
                .map_err(|e| StorageError::IoError(format!("Failed to resolve path: {}", e)))?;

            let root_canonical = self
                .root
                .canonicalize()
                .unwrap_or_else(|_| self.root.clone());

            if !canonical.starts_with(&root_canonical) {
                return Err(StorageError::PermissionDenied(
                    "Path escapes root directory".to_string(),
                ));
            }

            return Ok(canonical);
        }

        Ok(full)
    }
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.blob_path(container, name)?;

        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::not_found(container, name)
            } else {
                StorageError::IoError(format!("Failed to read {}/{}: {}", container, name, e))
            }
        })
    }

    async fn put(&self, container: &str, name: &str, content: &[u8]) -> Result<(), StorageError> {
        let dir = self.container_path(container)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::IoError(format!("Failed to create container {}: {}", container, e))
        })?;

        let path = self.blob_path(container, name)?;

        // Write to a sibling temp file then rename so readers never see a torn object
        let staging = dir.join(format!(".{}.partial", name));
        fs::write(&staging, content).await.map_err(|e| {
            StorageError::IoError(format!("Failed to write {}/{}: {}", container, name, e))
        })?;
        fs::rename(&staging, &path).await.map_err(|e| {
            StorageError::IoError(format!("Failed to replace {}/{}: {}", container, name, e))
        })?;

        debug!(container, name, bytes = content.len(), "Wrote blob");
        Ok(())
    }

    async fn list(&self, container: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.container_path(container)?;

        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::IoError(format!(
                    "Failed to list container {}: {}",
                    container, e
                )));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| StorageError::IoError(format!("Failed to read directory entry: {}", e)))?
        {
            if let Ok(file_type) = entry.file_type().await
                && file_type.is_file()
                && let Some(file_name) = entry.file_name().to_str()
                && !file_name.starts_with('.')
            {
                names.push(file_name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError> {
        let path = self.blob_path(container, name)?;

        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to check {}/{}: {}",
                container, name, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_traversal_blocked() {
        let temp = TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(temp.path());

        let result = store.blob_path("outputs", "../etc/passwd");
        assert!(matches!(result, Err(StorageError::PermissionDenied(_))));

        let result = store.blob_path("..", "passwd");
        assert!(matches!(result, Err(StorageError::PermissionDenied(_))));

        let result = store.blob_path("outputs", "avg_macros_bar_chart.png");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_staging_files_hidden_from_listing() {
        let temp = TempDir::new().unwrap();
        let store = FileSystemBlobStore::new(temp.path());

        store.put("raw", "recipes.csv", b"a,b\n1,2\n").await.unwrap();
        std::fs::write(temp.path().join("raw").join(".recipes.csv.partial"), b"x").unwrap();

        assert_eq!(store.list("raw").await.unwrap(), vec!["recipes.csv"]);
    }
}
