//! CLI error types

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::IngestError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read file {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Server error: {0}")]
    Server(String),
}
