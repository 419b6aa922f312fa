//! Error types for dataset parsing

use thiserror::Error;

/// Errors raised while reading a tabular file
#[derive(Error, Debug)]
pub enum DatasetError {
    /// CSV syntax or shape error (unequal row lengths, invalid UTF-8)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File has no header row
    #[error("Dataset is empty: no header row")]
    MissingHeader,

    /// A macronutrient cell that is neither missing nor a number
    #[error("Invalid number in column {column} at row {row}: {value:?}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
}
