//! Output publisher
//!
//! Writes the six derived artifacts of one transform run into the output
//! container. Each artifact is serialized in memory and uploaded with a single
//! whole-object `put`; the set as a whole is not transactional, so a failure
//! midway leaves earlier uploads of this run next to older copies of the rest.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::export::{ChartRenderer, CsvExporter, ExportError};
use crate::storage::{BlobStore, StorageError};
use crate::transform::TransformOutput;

/// The named objects a publish pass writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Artifact {
    AggregateCsv,
    TopProteinCsv,
    CleanedCsv,
    BarChart,
    Heatmap,
    Scatter,
}

impl Artifact {
    /// Every artifact, in upload order
    pub const ALL: [Artifact; 6] = [
        Artifact::AggregateCsv,
        Artifact::TopProteinCsv,
        Artifact::CleanedCsv,
        Artifact::BarChart,
        Artifact::Heatmap,
        Artifact::Scatter,
    ];

    /// Chart artifacts, as reported by the stats endpoint
    pub const CHARTS: [Artifact; 3] = [Artifact::BarChart, Artifact::Heatmap, Artifact::Scatter];

    pub fn blob_name(self) -> &'static str {
        match self {
            Artifact::CleanedCsv => "processed_data_with_metrics.csv",
            Artifact::AggregateCsv => "average_macros_by_diet.csv",
            Artifact::TopProteinCsv => "top5_protein_recipes_by_diet.csv",
            Artifact::BarChart => "avg_macros_bar_chart.png",
            Artifact::Heatmap => "macronutrient_heatmap.png",
            Artifact::Scatter => "top5_protein_scatter.png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Artifact::CleanedCsv | Artifact::AggregateCsv | Artifact::TopProteinCsv => "text/csv",
            Artifact::BarChart | Artifact::Heatmap | Artifact::Scatter => "image/png",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.blob_name())
    }
}

/// Error during a publish pass, naming the artifact that failed
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to render {artifact}: {source}")]
    Export {
        artifact: Artifact,
        #[source]
        source: ExportError,
    },
    #[error("Failed to upload {artifact}: {source}")]
    Storage {
        artifact: Artifact,
        #[source]
        source: StorageError,
    },
}

impl PublishError {
    pub fn artifact(&self) -> Artifact {
        match self {
            PublishError::Export { artifact, .. } | PublishError::Storage { artifact, .. } => {
                *artifact
            }
        }
    }
}

/// One uploaded artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedArtifact {
    pub name: &'static str,
    pub bytes: usize,
}

/// Summary of a completed publish pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub container: String,
    pub artifacts: Vec<PublishedArtifact>,
}

/// Serializes transform outputs and writes them to the output container
pub struct OutputPublisher {
    store: Arc<dyn BlobStore>,
    container: String,
    csv: CsvExporter,
    charts: ChartRenderer,
}

impl OutputPublisher {
    pub fn new(store: Arc<dyn BlobStore>, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
            csv: CsvExporter::new(),
            charts: ChartRenderer::new(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    fn render(&self, artifact: Artifact, output: &TransformOutput) -> Result<Vec<u8>, ExportError> {
        match artifact {
            Artifact::AggregateCsv => self.csv.export_aggregate(&output.aggregate),
            Artifact::TopProteinCsv => self
                .csv
                .export_top_protein(&output.top_protein, &output.cleaned),
            Artifact::CleanedCsv => self.csv.export_cleaned(&output.cleaned),
            Artifact::BarChart => self.charts.bar_chart(&output.aggregate),
            Artifact::Heatmap => self.charts.heatmap(&output.aggregate),
            Artifact::Scatter => self.charts.scatter(&output.top_protein),
        }
    }

    /// Render and upload all six artifacts in order, stopping at the first failure.
    ///
    /// Each artifact's buffer is dropped once uploaded, before the next is rendered.
    pub async fn publish(&self, output: &TransformOutput) -> Result<PublishReport, PublishError> {
        let mut report = PublishReport {
            container: self.container.clone(),
            artifacts: Vec::with_capacity(Artifact::ALL.len()),
        };

        for artifact in Artifact::ALL {
            let content = self
                .render(artifact, output)
                .map_err(|source| PublishError::Export { artifact, source })?;

            self.store
                .put(&self.container, artifact.blob_name(), &content)
                .await
                .map_err(|source| PublishError::Storage { artifact, source })?;

            info!(
                blob = artifact.blob_name(),
                container = %self.container,
                bytes = content.len(),
                "Uploaded {} to container {}",
                artifact.blob_name(),
                self.container
            );
            report.artifacts.push(PublishedArtifact {
                name: artifact.blob_name(),
                bytes: content.len(),
            });
        }

        Ok(report)
    }
}
