//! CSV exporter for the derived tables.
//!
//! Output follows the conventions the cached artifacts have always had: `\n`
//! line endings, minimal quoting, no index column, missing floats as empty
//! cells, infinities as `inf`/`-inf`, and whole-number columns without a
//! trailing `.0`.

use super::ExportError;
use crate::dataset::{
    CARBS_TO_FAT_RATIO, DIET_TYPE, Field, PROTEIN_TO_CARBS_RATIO, Slot, UNKNOWN,
};
use crate::transform::{AggregateByDiet, CleanedDataset, CleanedRecord, TopProteinByDiet};

/// Render a float the way the published tables expect
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        // Shortest round-trip form. Exponents print as `1e16` and `1e-7`, not the
        // zero-padded `1e+16` and `1e-07`; both read back as the same value.
        format!("{value:?}")
    }
}

fn format_measure(value: Option<f64>, integer: bool) -> String {
    match value {
        None => UNKNOWN.to_string(),
        Some(v) if integer => format!("{}", v as i64),
        Some(v) => format_float(v),
    }
}

/// Exporter for the three CSV artifacts
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }

    fn writer() -> ::csv::Writer<Vec<u8>> {
        ::csv::WriterBuilder::new()
            .terminator(::csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new())
    }

    fn finish(writer: ::csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
        writer
            .into_inner()
            .map_err(|e| ExportError::Csv(e.error().to_string()))
    }

    fn write_records<'a>(
        cleaned: &CleanedDataset,
        records: impl Iterator<Item = &'a CleanedRecord>,
        with_ratios: bool,
    ) -> Result<Vec<u8>, ExportError> {
        let mut writer = Self::writer();

        let mut header: Vec<&str> = cleaned.layout.headers().iter().map(String::as_str).collect();
        if with_ratios {
            header.extend([PROTEIN_TO_CARBS_RATIO, CARBS_TO_FAT_RATIO]);
        }
        writer.write_record(&header)?;

        for record in records {
            let mut row: Vec<String> = cleaned
                .layout
                .columns()
                .map(|(_, slot)| match slot {
                    Slot::Known(Field::DietType) => record.diet_type.clone(),
                    Slot::Known(Field::CuisineType) => record.cuisine_type.clone(),
                    Slot::Known(field) => format_measure(
                        record.number(field),
                        cleaned.integer_columns.contains(&field),
                    ),
                    Slot::Extra(i) => record.extra.get(i).cloned().unwrap_or_default(),
                })
                .collect();

            if with_ratios {
                row.push(format_float(record.protein_to_carbs));
                row.push(format_float(record.carbs_to_fat));
            }
            writer.write_record(&row)?;
        }

        Self::finish(writer)
    }

    /// `processed_data_with_metrics.csv`: every source column plus the two ratios
    pub fn export_cleaned(&self, cleaned: &CleanedDataset) -> Result<Vec<u8>, ExportError> {
        Self::write_records(cleaned, cleaned.records.iter(), true)
    }

    /// `top5_protein_recipes_by_diet.csv`: selected records with the source columns
    pub fn export_top_protein(
        &self,
        top: &TopProteinByDiet,
        cleaned: &CleanedDataset,
    ) -> Result<Vec<u8>, ExportError> {
        Self::write_records(cleaned, top.records.iter(), false)
    }

    /// `average_macros_by_diet.csv`: diet type first, then the three means
    pub fn export_aggregate(&self, aggregate: &AggregateByDiet) -> Result<Vec<u8>, ExportError> {
        let mut writer = Self::writer();

        let mut header = vec![DIET_TYPE];
        header.extend(Field::MACROS.map(Field::header));
        writer.write_record(&header)?;

        for (diet, means) in &aggregate.groups {
            let mut row = vec![diet.clone()];
            row.extend(means.values().map(format_float));
            writer.write_record(&row)?;
        }

        Self::finish(writer)
    }
}
