//! Ingestion trigger
//!
//! Runs the full pipeline for one raw dataset: parse, transform, publish. The
//! trigger does not catch pipeline failures. A failed run aborts, the artifacts
//! of the last successful run stay in place, and the error goes back to the
//! caller. There is no retry.

pub mod watch;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

use crate::dataset::{DatasetError, parse_csv};
use crate::publish::{OutputPublisher, PublishError, PublishedArtifact};
use crate::storage::{BlobStore, StorageError};
use crate::transform::{TransformError, transform};

pub use watch::RawWatcher;

/// Errors that abort an ingestion run
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Malformed dataset {name}: {source}")]
    Dataset {
        name: String,
        #[source]
        source: DatasetError,
    },
    #[error("Transform failed for {name}: {source}")]
    Transform {
        name: String,
        #[source]
        source: TransformError,
    },
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of a successful ingestion run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Logical name of the raw object
    pub source: String,
    /// SHA-256 of the raw bytes, lower-case hex
    pub sha256: String,
    pub rows: usize,
    pub diet_groups: usize,
    pub artifacts: Vec<PublishedArtifact>,
    pub completed_at: DateTime<Utc>,
    #[serde(skip)]
    pub duration: Duration,
}

/// Lower-case hex SHA-256 of `content`
pub fn fingerprint(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Handles newly deposited raw datasets
pub struct IngestionTrigger {
    store: Arc<dyn BlobStore>,
    publisher: OutputPublisher,
}

impl IngestionTrigger {
    pub fn new(store: Arc<dyn BlobStore>, outputs_container: impl Into<String>) -> Self {
        let publisher = OutputPublisher::new(store.clone(), outputs_container);
        Self { store, publisher }
    }

    pub fn outputs_container(&self) -> &str {
        self.publisher.container()
    }

    /// Run the pipeline on the full content of a raw object named `name`
    pub async fn handle(&self, name: &str, content: &[u8]) -> Result<IngestReport, IngestError> {
        let span = info_span!("ingest", blob = %name, bytes = content.len());
        self.run(name, content).instrument(span).await
    }

    async fn run(&self, name: &str, content: &[u8]) -> Result<IngestReport, IngestError> {
        let started = Instant::now();
        info!("{name} updated");

        let sha256 = fingerprint(content);
        let raw = parse_csv(content).map_err(|source| IngestError::Dataset {
            name: name.to_string(),
            source,
        })?;
        debug!(rows = raw.len(), columns = raw.layout.len(), "Parsed raw dataset");

        let output = transform(&raw).map_err(|source| IngestError::Transform {
            name: name.to_string(),
            source,
        })?;
        let published = self.publisher.publish(&output).await?;

        let report = IngestReport {
            source: name.to_string(),
            sha256,
            rows: output.cleaned.len(),
            diet_groups: output.aggregate.len(),
            artifacts: published.artifacts,
            completed_at: Utc::now(),
            duration: started.elapsed(),
        };
        info!(
            rows = report.rows,
            diet_groups = report.diet_groups,
            elapsed_ms = report.duration.as_millis() as u64,
            "Processing complete"
        );
        Ok(report)
    }

    /// Store `content` as `name` in the raw container, then run the pipeline on it
    pub async fn upload_and_handle(
        &self,
        raw_container: &str,
        name: &str,
        content: &[u8],
    ) -> Result<IngestReport, IngestError> {
        self.store.put(raw_container, name, content).await?;
        self.handle(name, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::Artifact;
    use crate::storage::memory::MemoryBlobStore;

    const SAMPLE: &[u8] = b"Diet_type,Cuisine_type,Protein(g),Carbs(g),Fat(g)\n\
        keto,french,30,5,20\n\
        vegan,asian,12,60,9\n\
        Keto,italian,22,7,25\n";

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_handle_reports_counts() {
        let store = Arc::new(MemoryBlobStore::new());
        let trigger = IngestionTrigger::new(store.clone(), "outputs");

        let report = trigger.handle("recipes.csv", SAMPLE).await.unwrap();
        assert_eq!(report.source, "recipes.csv");
        assert_eq!(report.rows, 3);
        assert_eq!(report.diet_groups, 2);
        assert_eq!(report.artifacts.len(), Artifact::ALL.len());
        assert_eq!(report.sha256, fingerprint(SAMPLE));
    }

    #[tokio::test]
    async fn test_failed_run_keeps_previous_artifacts() {
        let store = Arc::new(MemoryBlobStore::new());
        let trigger = IngestionTrigger::new(store.clone(), "outputs");
        trigger.handle("recipes.csv", SAMPLE).await.unwrap();
        let before = store
            .get("outputs", Artifact::CleanedCsv.blob_name())
            .await
            .unwrap();

        let err = trigger
            .handle("broken.csv", b"Diet_type,Protein(g),Carbs(g),Fat(g)\nketo,lots,5,20\n")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Dataset { .. }));

        let err = trigger
            .handle("no_fat.csv", b"Diet_type,Protein(g),Carbs(g)\nketo,10,5\n")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Transform { .. }));

        let after = store
            .get("outputs", Artifact::CleanedCsv.blob_name())
            .await
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_upload_and_handle_stores_raw_object() {
        let store = Arc::new(MemoryBlobStore::new());
        let trigger = IngestionTrigger::new(store.clone(), "outputs");

        trigger
            .upload_and_handle("raw", "recipes.csv", SAMPLE)
            .await
            .unwrap();
        assert_eq!(store.get("raw", "recipes.csv").await.unwrap(), SAMPLE);
    }
}
