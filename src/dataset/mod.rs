//! Raw nutrition dataset model
//!
//! A raw dataset is the parsed form of one uploaded CSV file. The five columns the
//! pipeline understands are typed fields on [`RawRecord`]; every other column is
//! carried through as opaque text so the cleaned output keeps the source shape.
//!
//! Which known columns a file actually has is a property of the whole file, kept in
//! the [`ColumnLayout`]. A `None` field on a record means the cell was missing, not
//! that the column is absent.

pub mod error;
pub mod parse;

use std::collections::BTreeSet;

pub use error::DatasetError;
pub use parse::{is_missing, parse_csv};

pub const DIET_TYPE: &str = "Diet_type";
pub const CUISINE_TYPE: &str = "Cuisine_type";
pub const PROTEIN: &str = "Protein(g)";
pub const CARBS: &str = "Carbs(g)";
pub const FAT: &str = "Fat(g)";
pub const PROTEIN_TO_CARBS_RATIO: &str = "Protein_to_Carbs_ratio";
pub const CARBS_TO_FAT_RATIO: &str = "Carbs_to_Fat_ratio";

/// Fill value for any cell still missing after imputation
pub const UNKNOWN: &str = "Unknown";

/// Columns with pipeline-specific semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    DietType,
    CuisineType,
    Protein,
    Carbs,
    Fat,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::DietType,
        Field::CuisineType,
        Field::Protein,
        Field::Carbs,
        Field::Fat,
    ];

    /// Numeric macronutrient columns, in output order
    pub const MACROS: [Field; 3] = [Field::Protein, Field::Carbs, Field::Fat];

    pub fn header(self) -> &'static str {
        match self {
            Field::DietType => DIET_TYPE,
            Field::CuisineType => CUISINE_TYPE,
            Field::Protein => PROTEIN,
            Field::Carbs => CARBS,
            Field::Fat => FAT,
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.header() == header)
    }
}

/// Where the value of a column lives on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Known(Field),
    Extra(usize),
}

/// Header order of a source file and the slot each header maps to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    headers: Vec<String>,
    slots: Vec<Slot>,
}

impl ColumnLayout {
    /// Build a layout from a header row.
    ///
    /// The first occurrence of a known header binds to its field; a repeated
    /// header is carried as an extra column.
    pub fn from_headers(headers: Vec<String>) -> Self {
        let mut seen = BTreeSet::new();
        let mut extra = 0;
        let slots = headers
            .iter()
            .map(|header| match Field::from_header(header) {
                Some(field) if seen.insert(field) => Slot::Known(field),
                _ => {
                    extra += 1;
                    Slot::Extra(extra - 1)
                }
            })
            .collect();

        Self { headers, slots }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, Slot)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.slots.iter().copied())
    }

    pub fn has(&self, field: Field) -> bool {
        self.slots.contains(&Slot::Known(field))
    }

    pub fn extra_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Extra(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// One row of the source dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub diet_type: Option<String>,
    pub cuisine_type: Option<String>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    /// Values of the extra columns, indexed by [`Slot::Extra`]
    pub extra: Vec<Option<String>>,
}

impl RawRecord {
    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::Protein => self.protein_g,
            Field::Carbs => self.carbs_g,
            Field::Fat => self.fat_g,
            Field::DietType | Field::CuisineType => None,
        }
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::DietType => self.diet_type.as_deref(),
            Field::CuisineType => self.cuisine_type.as_deref(),
            _ => None,
        }
    }
}

/// A parsed source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    pub layout: ColumnLayout,
    pub records: Vec<RawRecord>,
    /// Numeric columns whose every cell is present and written as a whole number.
    /// These keep integer formatting when the cleaned dataset is serialized.
    pub integer_columns: BTreeSet<Field>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
