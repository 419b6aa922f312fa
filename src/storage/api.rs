//! HTTP blob store
//!
//! Implements BlobStore against a remote object service exposing
//! `GET/PUT {base_url}/{container}/{name}` and `GET {base_url}/{container}`
//! (a JSON array of blob names).
//!
//! ## Security
//!
//! Container and blob names are validated as single path segments and
//! percent-encoded before they are placed in a URL.

use super::{BlobStore, StorageError, validate_segment};
use async_trait::async_trait;
use reqwest::StatusCode;

/// HTTP blob store that talks to a remote object service
pub struct HttpBlobStore {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpBlobStore {
    /// Create a new HTTP blob store
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the object service (e.g., "https://blobs.example.com/v1")
    /// * `auth_token` - Optional bearer token for authentication
    ///
    /// # Example
    ///
    /// ```rust
    /// use nutrition_insights::storage::api::HttpBlobStore;
    ///
    /// let store = HttpBlobStore::new("https://blobs.example.com/v1", None);
    /// ```
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
            client: reqwest::Client::new(),
        }
    }

    fn container_url(&self, container: &str) -> Result<String, StorageError> {
        validate_segment("Container", container)?;
        Ok(format!(
            "{}/{}",
            self.base_url,
            urlencoding::encode(container)
        ))
    }

    fn blob_url(&self, container: &str, name: &str) -> Result<String, StorageError> {
        validate_segment("Blob", name)?;
        Ok(format!(
            "{}/{}",
            self.container_url(container)?,
            urlencoding::encode(name)
        ))
    }

    /// Build a request with authentication headers
    fn build_request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);

        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.blob_url(container, name)?;
        let response = self
            .build_request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| StorageError::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::not_found(container, name)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                StorageError::PermissionDenied(format!("{} returned {}", url, response.status())),
            ),
            status if !status.is_success() => Err(StorageError::BackendError(format!(
                "Fetch {} failed: {}",
                url, status
            ))),
            _ => {
                let bytes = response.bytes().await.map_err(|e| {
                    StorageError::NetworkError(format!("Failed to read body of {}: {}", url, e))
                })?;
                Ok(bytes.to_vec())
            }
        }
    }

    async fn put(&self, container: &str, name: &str, content: &[u8]) -> Result<(), StorageError> {
        let url = self.blob_url(container, name)?;
        let response = self
            .build_request(reqwest::Method::PUT, &url)
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::NetworkError(format!("Failed to upload {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(StorageError::BackendError(format!(
                "Upload {} failed: {}",
                url,
                response.status()
            )));
        }

        Ok(())
    }

    async fn list(&self, container: &str) -> Result<Vec<String>, StorageError> {
        let url = self.container_url(container)?;
        let response = self
            .build_request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| StorageError::NetworkError(format!("Failed to list {}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(StorageError::BackendError(format!(
                "List {} failed: {}",
                url,
                response.status()
            )));
        }

        response.json::<Vec<String>>().await.map_err(|e| {
            StorageError::BackendError(format!("Failed to parse listing of {}: {}", url, e))
        })
    }

    async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError> {
        let url = self.blob_url(container, name)?;
        let response = self
            .build_request(reqwest::Method::HEAD, &url)
            .send()
            .await
            .map_err(|e| StorageError::NetworkError(format!("Failed to probe {}: {}", url, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StorageError::BackendError(format!(
                "Probe {} failed: {}",
                url, status
            ))),
        }
    }
}
