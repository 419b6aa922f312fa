//! Application configuration
//!
//! Loaded from an optional TOML file, then overridden by `NUTRI_*` environment
//! variables, then validated. Every section has defaults, so an empty file (or
//! no file) is a valid configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::storage::BlobStore;
use crate::storage::filesystem::FileSystemBlobStore;
use crate::storage::memory::MemoryBlobStore;

pub const ENV_HOST: &str = "NUTRI_HOST";
pub const ENV_PORT: &str = "NUTRI_PORT";
pub const ENV_STORAGE_ROOT: &str = "NUTRI_STORAGE_ROOT";
pub const ENV_STORAGE_TOKEN: &str = "NUTRI_STORAGE_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7071,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Filesystem,
    Memory,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Root directory for the filesystem backend
    pub root: PathBuf,
    /// Base URL for the http backend
    pub base_url: Option<String>,
    /// Bearer token for the http backend
    pub token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Filesystem,
            root: PathBuf::from("./data"),
            base_url: None,
            token: None,
        }
    }
}

impl StorageConfig {
    /// Construct the configured store. Called once per process.
    pub fn open(&self) -> Result<Arc<dyn BlobStore>, ConfigError> {
        match self.backend {
            StorageBackendKind::Filesystem => {
                Ok(Arc::new(FileSystemBlobStore::new(self.root.clone())))
            }
            StorageBackendKind::Memory => Ok(Arc::new(MemoryBlobStore::new())),
            #[cfg(feature = "api-backend")]
            StorageBackendKind::Http => {
                let base_url = self.base_url.clone().ok_or_else(|| {
                    ConfigError::Invalid("storage.base_url is required for the http backend".into())
                })?;
                Ok(Arc::new(crate::storage::api::HttpBlobStore::new(
                    base_url,
                    self.token.clone(),
                )))
            }
            #[cfg(not(feature = "api-backend"))]
            StorageBackendKind::Http => Err(ConfigError::Invalid(
                "http storage backend requires the api-backend feature".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub raw: String,
    pub outputs: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            raw: "raw".to_string(),
            outputs: "outputs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: crate::query::DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub containers: ContainerConfig,
    pub query: QueryConfig,
    pub watch: WatchConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path` (if given) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!(path = %path.display(), "Loaded configuration file");
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override settings from environment variables resolved by `lookup`
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(root) = lookup(ENV_STORAGE_ROOT) {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(token) = lookup(ENV_STORAGE_TOKEN) {
            self.storage.token = Some(token);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "query.default_page_size must be at least 1".into(),
            ));
        }
        if self.watch.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "watch.interval_secs must be at least 1".into(),
            ));
        }
        if self.containers.raw.is_empty() || self.containers.outputs.is_empty() {
            return Err(ConfigError::Invalid("container names cannot be empty".into()));
        }
        if self.storage.backend == StorageBackendKind::Http
            && self.storage.base_url.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "storage.base_url is required for the http backend".into(),
            ));
        }
        Ok(())
    }

    /// Set the storage backend
    pub fn with_backend(mut self, backend: StorageBackendKind) -> Self {
        self.storage.backend = backend;
        self
    }

    /// Set the filesystem storage root
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage.root = root.into();
        self
    }
}
