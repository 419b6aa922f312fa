//! Nutrition Insights - cache-then-serve analytics for diet datasets
//!
//! Provides:
//! - Blob storage backends (filesystem, in-memory, HTTP object service)
//! - Raw dataset parsing and the transform stage (cleaning, aggregation, top-N)
//! - CSV and PNG export of the derived tables
//! - Output publishing and the ingestion trigger, with a raw-container watcher
//! - Read-side queries and the HTTP server exposing them

pub mod cli;
pub mod config;
pub mod dataset;
pub mod export;
pub mod ingest;
pub mod publish;
pub mod query;
pub mod server;
pub mod storage;
pub mod transform;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use dataset::{DatasetError, RawDataset, RawRecord, parse_csv};
pub use export::{ChartRenderer, CsvExporter, ExportError};
pub use ingest::{IngestError, IngestReport, IngestionTrigger, RawWatcher};
pub use publish::{Artifact, OutputPublisher, PublishError, PublishReport};
pub use query::{PageResult, ProcessingStats, QueryError, QueryService, RowFilter};
pub use storage::filesystem::FileSystemBlobStore;
pub use storage::memory::MemoryBlobStore;
#[cfg(feature = "api-backend")]
pub use storage::api::HttpBlobStore;
pub use storage::{BlobStore, StorageError};
pub use transform::{
    AggregateByDiet, CleanedDataset, CleanedRecord, TopProteinByDiet, TransformError,
    TransformOutput, transform,
};
