//! Read-side queries over the cached cleaned dataset
//!
//! Every query loads `processed_data_with_metrics.csv` from the output container
//! on each call. Nothing is cached in process, so a query running while an
//! ingestion republishes may see either the old or the new table.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::dataset::{DIET_TYPE, DatasetError, parse::csv_reader};
use crate::publish::Artifact;
use crate::storage::{BlobStore, StorageError};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Errors raised by a query
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

impl From<csv::Error> for QueryError {
    fn from(err: csv::Error) -> Self {
        QueryError::Dataset(DatasetError::Csv(err))
    }
}

/// The cached cleaned dataset as stored: header row plus string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CachedTable {
    pub fn parse(bytes: &[u8]) -> Result<Self, QueryError> {
        let mut reader = csv_reader(bytes);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<_, csv::Error>>()?;
        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Rows that pass the diet filter and then the keyword filter
    pub fn filter<'a>(&'a self, filter: &RowFilter) -> Vec<&'a [String]> {
        let diet_column = self.column(DIET_TYPE);
        let diet = filter.diet.as_deref().map(str::to_lowercase);
        let keyword = filter.keyword.as_deref().map(str::to_lowercase);

        self.rows
            .iter()
            .map(Vec::as_slice)
            .filter(|row| match (&diet, diet_column) {
                (None, _) => true,
                (Some(diet), Some(i)) => row.get(i).is_some_and(|v| v.to_lowercase() == *diet),
                (Some(_), None) => false,
            })
            .filter(|row| match &keyword {
                None => true,
                Some(keyword) => row.join(" ").to_lowercase().contains(keyword.as_str()),
            })
            .collect()
    }

    /// A row as a JSON object keyed by header, in column order
    pub fn to_json(&self, row: &[String]) -> Value {
        let object: Map<String, Value> = self
            .headers
            .iter()
            .zip(row)
            .map(|(header, cell)| (header.clone(), cell_value(cell)))
            .collect();
        Value::Object(object)
    }
}

/// Empty cells become `null`, finite numbers become JSON numbers, the rest stays text
pub fn cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Value::from(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(cell.to_string()),
    }
}

/// Diet and keyword filters; empty strings mean "no filter"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub diet: Option<String>,
    pub keyword: Option<String>,
}

impl RowFilter {
    pub fn new(diet: Option<String>, keyword: Option<String>) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            diet: non_empty(diet),
            keyword: non_empty(keyword),
        }
    }
}

/// One page of the filtered table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub data: Vec<Value>,
}

/// Slice `rows` into page `page` of `page_size` rows.
///
/// `page` and `page_size` below 1 are treated as 1.
pub fn paginate<T: Clone>(rows: &[T], page: usize, page_size: usize) -> (Vec<T>, usize) {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_pages = rows.len().div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);
    let data = rows.iter().skip(start).take(page_size).cloned().collect();
    (data, total_pages)
}

/// Filtering statistics and the chart manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub rows_processed: usize,
    pub processing_time_ms: u64,
    pub uploaded_files: Vec<&'static str>,
}

/// Queries against the output container
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn BlobStore>,
    container: String,
}

impl QueryService {
    pub fn new(store: Arc<dyn BlobStore>, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
        }
    }

    /// Stored bytes of the cleaned dataset, unmodified
    pub async fn raw(&self) -> Result<Vec<u8>, QueryError> {
        Ok(self
            .store
            .get(&self.container, Artifact::CleanedCsv.blob_name())
            .await?)
    }

    async fn load(&self) -> Result<CachedTable, QueryError> {
        let table = CachedTable::parse(&self.raw().await?)?;
        debug!(rows = table.len(), "Loaded cached dataset");
        Ok(table)
    }

    pub async fn page(
        &self,
        filter: &RowFilter,
        page: usize,
        page_size: usize,
    ) -> Result<PageResult, QueryError> {
        let table = self.load().await?;
        let rows = table.filter(filter);
        let (slice, total_pages) = paginate(&rows, page, page_size);

        Ok(PageResult {
            page: page.max(1),
            page_size: page_size.max(1),
            total_pages,
            total_rows: rows.len(),
            data: slice.into_iter().map(|row| table.to_json(row)).collect(),
        })
    }

    pub async fn stats(&self, filter: &RowFilter) -> Result<ProcessingStats, QueryError> {
        let table = self.load().await?;

        let started = Instant::now();
        let rows_processed = table.filter(filter).len();
        let processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(ProcessingStats {
            rows_processed,
            processing_time_ms,
            uploaded_files: Artifact::CHARTS.map(Artifact::blob_name).to_vec(),
        })
    }
}
