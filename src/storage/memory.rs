//! In-memory blob store
//!
//! Keeps every container in a process-local map. Contents are lost when the
//! process exits.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BlobStore, StorageError, validate_segment};

#[derive(Default)]
pub struct MemoryBlobStore {
    containers: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn remove(&self, container: &str, name: &str) {
        if let Some(blobs) = self.containers.write().await.get_mut(container) {
            blobs.remove(name);
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let containers = self.containers.read().await;
        containers
            .get(container)
            .and_then(|blobs| blobs.get(name))
            .cloned()
            .ok_or_else(|| StorageError::not_found(container, name))
    }

    async fn put(&self, container: &str, name: &str, content: &[u8]) -> Result<(), StorageError> {
        validate_segment("Container", container)?;
        validate_segment("Blob", name)?;

        let mut containers = self.containers.write().await;
        containers
            .entry(container.to_string())
            .or_default()
            .insert(name.to_string(), content.to_vec());
        Ok(())
    }

    async fn list(&self, container: &str) -> Result<Vec<String>, StorageError> {
        let containers = self.containers.read().await;
        Ok(containers
            .get(container)
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError> {
        let containers = self.containers.read().await;
        Ok(containers
            .get(container)
            .is_some_and(|blobs| blobs.contains_key(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryBlobStore::new();
        store.put("outputs", "a.csv", b"first").await.unwrap();
        store.put("outputs", "a.csv", b"second").await.unwrap();

        assert_eq!(store.get("outputs", "a.csv").await.unwrap(), b"second");
        assert_eq!(store.list("outputs").await.unwrap(), vec!["a.csv"]);
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let store = MemoryBlobStore::new();
        let err = store.get("outputs", "missing.csv").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists("outputs", "missing.csv").await.unwrap());
        assert!(store.list("never-written").await.unwrap().is_empty());
    }
}
