//! Export functionality
//!
//! Serializes transform outputs into the formats the publisher uploads:
//! - CSV tables (cleaned dataset, per-diet means, top-protein records)
//! - PNG charts (grouped bar chart, annotated heatmap, scatter plot)

pub mod csv;
pub mod png;

pub use self::csv::CsvExporter;
pub use self::png::ChartRenderer;

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV serialization error: {0}")]
    Csv(String),
    #[error("Chart drawing error: {0}")]
    Chart(String),
    #[error("PNG encoding error: {0}")]
    Png(String),
}

impl From<::csv::Error> for ExportError {
    fn from(err: ::csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Png(err.to_string())
    }
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for ExportError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ExportError::Chart(err.to_string())
    }
}
