//! CSV parsing for raw datasets

use std::collections::BTreeSet;

use super::{ColumnLayout, DatasetError, Field, RawDataset, RawRecord, Slot};

/// Cell values treated as missing, in addition to the empty string
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Whether a raw cell denotes a missing value
pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_MARKERS.contains(&cell)
}

pub(crate) fn csv_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes)
}

/// Parse the full content of an uploaded CSV file.
///
/// Text columns keep their raw value (cleaning happens in the transform stage);
/// macronutrient columns are parsed as `f64`.
pub fn parse_csv(bytes: &[u8]) -> Result<RawDataset, DatasetError> {
    let mut reader = csv_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(DatasetError::MissingHeader);
    }

    let layout = ColumnLayout::from_headers(headers);
    let extra_count = layout.extra_count();

    let mut integer_columns: BTreeSet<Field> = Field::MACROS
        .into_iter()
        .filter(|field| layout.has(*field))
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let mut record = RawRecord {
            extra: vec![None; extra_count],
            ..RawRecord::default()
        };

        for ((header, slot), cell) in layout.columns().zip(row.iter()) {
            let value = (!is_missing(cell)).then(|| cell.to_string());

            match slot {
                Slot::Known(Field::DietType) => record.diet_type = value,
                Slot::Known(Field::CuisineType) => record.cuisine_type = value,
                Slot::Known(field) => {
                    let number = match value {
                        Some(text) => Some(parse_number(&text, header, index + 1)?),
                        None => None,
                    };
                    if number.is_none() || cell.trim().parse::<i64>().is_err() {
                        integer_columns.remove(&field);
                    }
                    match field {
                        Field::Protein => record.protein_g = number,
                        Field::Carbs => record.carbs_g = number,
                        _ => record.fat_g = number,
                    }
                }
                Slot::Extra(i) => record.extra[i] = value,
            }
        }

        records.push(record);
    }

    Ok(RawDataset {
        layout,
        records,
        integer_columns,
    })
}

fn parse_number(text: &str, column: &str, row: usize) -> Result<f64, DatasetError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| DatasetError::InvalidNumber {
            column: column.to_string(),
            row,
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g),Extraction_day\n\
        paleo,Bone Broth,american,5.2,0.5,1.1,2022-10-16\n\
        vegan, Tofu Bowl ,asian,,40,12,\n";

    #[test]
    fn test_parse_sample() {
        let dataset = parse_csv(SAMPLE.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.layout.extra_count(), 2);
        assert_eq!(dataset.records[0].diet_type.as_deref(), Some("paleo"));
        assert_eq!(dataset.records[0].protein_g, Some(5.2));
        assert_eq!(dataset.records[1].protein_g, None);
        assert_eq!(
            dataset.records[1].extra,
            vec![Some(" Tofu Bowl ".to_string()), None]
        );
    }

    #[test]
    fn test_integer_columns_detected() {
        let csv = "Diet_type,Protein(g),Carbs(g),Fat(g)\nketo,10,5,20.5\nketo,12,,30\n";
        let dataset = parse_csv(csv.as_bytes()).unwrap();

        assert!(dataset.integer_columns.contains(&Field::Protein));
        assert!(!dataset.integer_columns.contains(&Field::Carbs));
        assert!(!dataset.integer_columns.contains(&Field::Fat));
    }

    #[test]
    fn test_na_markers_are_missing() {
        let csv = "Diet_type,Protein(g)\nNA,null\nketo,N/A\n";
        let dataset = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(dataset.records[0].diet_type, None);
        assert_eq!(dataset.records[0].protein_g, None);
        assert_eq!(dataset.records[1].protein_g, None);
    }

    #[test]
    fn test_invalid_number_reports_position() {
        let csv = "Diet_type,Protein(g)\nketo,lots\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();

        match err {
            DatasetError::InvalidNumber { column, row, value } => {
                assert_eq!(column, "Protein(g)");
                assert_eq!(row, 1);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let csv = "Diet_type,Protein(g)\nketo,1,extra\n";
        assert!(matches!(
            parse_csv(csv.as_bytes()),
            Err(DatasetError::Csv(_))
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(parse_csv(b""), Err(DatasetError::MissingHeader)));
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let dataset = parse_csv(b"\xEF\xBB\xBFDiet_type,Protein(g)\n").unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.layout.has(Field::DietType));
    }
}
