//! Transform stage
//!
//! Turns one raw dataset into the three derived tables the publisher persists:
//! the cleaned dataset, the per-diet macronutrient means and the per-diet
//! top-protein records. Everything here is pure and recomputed from the
//! current batch only.

mod aggregate;
mod clean;

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::dataset::{ColumnLayout, Field, RawDataset};

pub use aggregate::{TOP_N, aggregate_by_diet, top_protein_by_diet};
pub use clean::{clean, title_case};

/// Errors raised when the dataset lacks what a required computation needs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Required column missing: {0}")]
    MissingColumn(&'static str),
}

/// A record after normalization, imputation and ratio derivation
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub diet_type: String,
    pub cuisine_type: String,
    /// `None` is the `Unknown` fill: the column had no value to impute from
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub extra: Vec<String>,
    /// `Protein(g) / Carbs(g)`; may be infinite or NaN
    pub protein_to_carbs: f64,
    /// `Carbs(g) / Fat(g)`; may be infinite or NaN
    pub carbs_to_fat: f64,
}

impl CleanedRecord {
    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::Protein => self.protein_g,
            Field::Carbs => self.carbs_g,
            Field::Fat => self.fat_g,
            Field::DietType | Field::CuisineType => None,
        }
    }
}

/// The canonical cached table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedDataset {
    pub layout: ColumnLayout,
    pub records: Vec<CleanedRecord>,
    pub integer_columns: BTreeSet<Field>,
}

impl CleanedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Mean macronutrients of one diet group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroMeans {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroMeans {
    pub fn values(&self) -> [f64; 3] {
        [self.protein, self.carbs, self.fat]
    }
}

/// Per-diet means, keyed by cleaned diet type in ascending order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateByDiet {
    pub groups: BTreeMap<String, MacroMeans>,
}

impl AggregateByDiet {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, diet: &str) -> Option<&MacroMeans> {
        self.groups.get(diet)
    }
}

/// Highest-protein records per diet, in descending protein order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopProteinByDiet {
    pub records: Vec<CleanedRecord>,
}

/// Everything one transform run produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    pub cleaned: CleanedDataset,
    pub aggregate: AggregateByDiet,
    pub top_protein: TopProteinByDiet,
}

/// Run the full transform stage.
///
/// Cleaning tolerates absent columns. Aggregation and ratio derivation need the
/// diet type and all three macronutrient columns.
pub fn transform(raw: &RawDataset) -> Result<TransformOutput, TransformError> {
    for field in [Field::DietType, Field::Protein, Field::Carbs, Field::Fat] {
        if !raw.layout.has(field) {
            return Err(TransformError::MissingColumn(field.header()));
        }
    }

    let cleaned = clean(raw);
    let aggregate = aggregate_by_diet(&cleaned);
    let top_protein = top_protein_by_diet(&cleaned);

    Ok(TransformOutput {
        cleaned,
        aggregate,
        top_protein,
    })
}
