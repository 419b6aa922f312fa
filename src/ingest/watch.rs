//! Raw-container watcher
//!
//! Polls the raw container and runs the ingestion trigger for every blob that
//! is new or whose content fingerprint changed. Fingerprints are kept as
//! receipts in the outputs container, so a restarted watcher resumes where the
//! previous one stopped instead of replaying every raw blob.
//!
//! A failed run is logged and its receipt recorded too, so the blob is only
//! retried once its content changes. Blobs found changed in the same poll are
//! handled in listing order, which is ascending by name.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::{IngestionTrigger, fingerprint};
use crate::storage::{BlobStore, StorageError};

/// Result of one poll over the raw container
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub processed: Vec<String>,
    pub failed: Vec<String>,
    pub unchanged: usize,
    /// Receipts dropped because their raw blob is gone
    pub pruned: usize,
}

/// What the watcher last did with one raw blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub sha256: String,
    pub succeeded: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Receipts of one raw container, keyed by blob name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    pub blobs: BTreeMap<String, Receipt>,
}

impl ReceiptLog {
    fn is_current(&self, name: &str, sha256: &str) -> bool {
        self.blobs
            .get(name)
            .is_some_and(|receipt| receipt.sha256 == sha256)
    }

    fn record(&mut self, name: String, sha256: String, succeeded: bool) {
        self.blobs.insert(
            name,
            Receipt {
                sha256,
                succeeded,
                recorded_at: Utc::now(),
            },
        );
    }

    /// Drop receipts whose blob is not in `present`; returns how many went
    fn retain_present(&mut self, present: &[String]) -> usize {
        let before = self.blobs.len();
        self.blobs.retain(|name, _| present.contains(name));
        before - self.blobs.len()
    }
}

/// Name of the receipt object for `raw_container`
pub fn receipts_blob_name(raw_container: &str) -> String {
    format!("{raw_container}_receipts.json")
}

pub struct RawWatcher {
    store: Arc<dyn BlobStore>,
    container: String,
    trigger: Arc<IngestionTrigger>,
    interval: Duration,
    receipts: Option<ReceiptLog>,
}

impl RawWatcher {
    pub fn new(
        store: Arc<dyn BlobStore>,
        container: impl Into<String>,
        trigger: Arc<IngestionTrigger>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            container: container.into(),
            trigger,
            interval,
            receipts: None,
        }
    }

    fn receipts_location(&self) -> (&str, String) {
        (
            self.trigger.outputs_container(),
            receipts_blob_name(&self.container),
        )
    }

    async fn load_receipts(&self) -> Result<ReceiptLog, StorageError> {
        let (container, name) = self.receipts_location();
        let bytes = match self.store.get(container, &name).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(ReceiptLog::default()),
            Err(e) => return Err(e),
        };

        let log: ReceiptLog = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::BackendError(format!("Malformed receipts {container}/{name}: {e}"))
        })?;
        debug!(blobs = log.blobs.len(), "Loaded ingest receipts");
        Ok(log)
    }

    async fn save_receipts(&self, log: &ReceiptLog) -> Result<(), StorageError> {
        let (container, name) = self.receipts_location();
        let bytes = serde_json::to_vec_pretty(log)
            .map_err(|e| StorageError::BackendError(format!("Failed to encode receipts: {e}")))?;
        self.store.put(container, &name, &bytes).await
    }

    /// Check every blob in the raw container once
    pub async fn poll_once(&mut self) -> Result<PollSummary, StorageError> {
        let mut receipts = match self.receipts.take() {
            Some(receipts) => receipts,
            None => self.load_receipts().await?,
        };

        let result = self.poll_with(&mut receipts).await;
        self.receipts = Some(receipts);
        result
    }

    async fn poll_with(&self, receipts: &mut ReceiptLog) -> Result<PollSummary, StorageError> {
        let mut summary = PollSummary::default();
        let names = self.store.list(&self.container).await?;

        for name in &names {
            let content = match self.store.get(&self.container, name).await {
                Ok(content) => content,
                // Deleted between list and get
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };

            let hash = fingerprint(&content);
            if receipts.is_current(name, &hash) {
                summary.unchanged += 1;
                continue;
            }

            let succeeded = match self.trigger.handle(name, &content).await {
                Ok(report) => {
                    debug!(blob = %name, sha256 = %report.sha256, "Ingested raw blob");
                    summary.processed.push(name.clone());
                    true
                }
                Err(e) => {
                    error!(blob = %name, error = %e, "Ingestion failed");
                    summary.failed.push(name.clone());
                    false
                }
            };
            receipts.record(name.clone(), hash, succeeded);
            // Persist per blob so a crash mid-poll does not replay finished runs
            self.save_receipts(receipts).await?;
        }

        summary.pruned = receipts.retain_present(&names);
        if summary.pruned > 0 {
            debug!(pruned = summary.pruned, "Dropped receipts of deleted raw blobs");
            self.save_receipts(receipts).await?;
        }

        Ok(summary)
    }

    /// Poll on the configured interval until `shutdown` resolves
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) {
        info!(
            container = %self.container,
            interval_secs = self.interval.as_secs(),
            "Watching raw container"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!(container = %self.container, error = %e, "Failed to poll raw container");
                    }
                }
            }
        }

        info!("Raw container watcher stopped");
    }
}
