use crate::dataset::{Field, RawDataset, RawRecord, UNKNOWN};

use super::{CleanedDataset, CleanedRecord};

/// Upper-case the first letter of every word and lower-case the rest.
///
/// A word starts at any letter not preceded by another letter, so `low-carb`
/// becomes `Low-Carb` and `3rd` becomes `3Rd`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;

    for c in input.chars() {
        if previous_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_is_letter = c.is_alphabetic();
    }

    out
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn normalize_category(raw: &RawDataset, field: Field, value: Option<&str>) -> String {
    match value {
        Some(text) if raw.layout.has(field) => title_case(text.trim()),
        _ => UNKNOWN.to_string(),
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    match (numerator, denominator) {
        (Some(n), Some(d)) => n / d,
        _ => f64::NAN,
    }
}

/// Normalize categories, impute macronutrients and derive the ratio columns.
///
/// Means are taken over the present values of this batch. A macronutrient column
/// with no present value has no mean, so its cells stay unknown.
pub fn clean(raw: &RawDataset) -> CleanedDataset {
    let column_means: [Option<f64>; 3] = Field::MACROS.map(|field| {
        if raw.layout.has(field) {
            mean(raw.records.iter().filter_map(|r| r.number(field)))
        } else {
            None
        }
    });

    let impute = |record: &RawRecord, index: usize| {
        record
            .number(Field::MACROS[index])
            .or(column_means[index])
    };

    let records = raw
        .records
        .iter()
        .map(|record| {
            let protein_g = impute(record, 0);
            let carbs_g = impute(record, 1);
            let fat_g = impute(record, 2);

            CleanedRecord {
                diet_type: normalize_category(raw, Field::DietType, record.text(Field::DietType)),
                cuisine_type: normalize_category(
                    raw,
                    Field::CuisineType,
                    record.text(Field::CuisineType),
                ),
                protein_g,
                carbs_g,
                fat_g,
                extra: record
                    .extra
                    .iter()
                    .map(|value| value.clone().unwrap_or_else(|| UNKNOWN.to_string()))
                    .collect(),
                protein_to_carbs: ratio(protein_g, carbs_g),
                carbs_to_fat: ratio(carbs_g, fat_g),
            }
        })
        .collect();

    CleanedDataset {
        layout: raw.layout.clone(),
        records,
        integer_columns: raw.integer_columns.clone(),
    }
}
