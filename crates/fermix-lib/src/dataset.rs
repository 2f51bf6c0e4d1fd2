//! Tabular KOI dataset served page by page
//!
//! Both tables are read from CSV once at startup. Cells are typed on load:
//! empty and non-finite cells become null, integer and float literals
//! become numbers, everything else stays a string.

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper bound on rows per page
pub const MAX_PAGE_SIZE: usize = 500;

/// One page of dataset rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPage {
    pub page: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub data: Vec<Map<String, Value>>,
}

/// An in-memory table with typed cells
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DatasetTable {
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DatasetError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DatasetError::Unreadable(format!("{}: {}", path.display(), e))
            }
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = csv
            .headers()
            .map_err(|e| DatasetError::Unreadable(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record.map_err(|e| DatasetError::Unreadable(e.to_string()))?;
            rows.push(record.iter().map(parse_cell).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Slice out a 1-indexed page
    pub fn page(
        &self,
        page: usize,
        page_size: usize,
        max_page_size: usize,
    ) -> Result<DatasetPage, DatasetError> {
        if page < 1 {
            return Err(DatasetError::InvalidQuery("page must be at least 1".to_string()));
        }
        if page_size < 1 || page_size > max_page_size {
            return Err(DatasetError::InvalidQuery(format!(
                "page_size must be between 1 and {}",
                max_page_size
            )));
        }

        let total_records = self.rows.len();
        let total_pages = total_records.div_ceil(page_size);
        if page > total_pages {
            return Err(DatasetError::PageOutOfRange { page, total_pages });
        }

        let start = (page - 1) * page_size;
        let end = (start + page_size).min(total_records);
        let data = self.rows[start..end]
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Map<String, Value>>()
            })
            .collect();

        Ok(DatasetPage {
            page,
            page_size,
            total_records,
            total_pages,
            data,
        })
    }
}

fn parse_cell(raw: &str) -> Value {
    let cell = raw.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = cell.parse::<f64>() {
        return Number::from_f64(float).map(Value::Number).unwrap_or(Value::Null);
    }
    Value::String(cell.to_string())
}

#[derive(Debug)]
enum TableState {
    Loaded(DatasetTable),
    Missing(PathBuf),
    Failed(String),
}

impl TableState {
    fn load(path: &Path, name: &str) -> Self {
        match DatasetTable::from_path(path) {
            Ok(table) => {
                info!(dataset = name, rows = table.len(), path = %path.display(), "Dataset loaded");
                TableState::Loaded(table)
            }
            Err(DatasetError::NotFound { path }) => {
                warn!(dataset = name, path = %path.display(), "Dataset file not found");
                TableState::Missing(path)
            }
            Err(e) => {
                warn!(dataset = name, error = %e, "Failed to load dataset");
                TableState::Failed(e.to_string())
            }
        }
    }
}

/// The sample and full tables
#[derive(Debug)]
pub struct DatasetStore {
    sample: TableState,
    full: TableState,
    max_page_size: usize,
}

impl DatasetStore {
    /// Load both tables. A missing or unreadable file is recorded and
    /// reported when that table is requested.
    pub fn load(sample_path: &Path, full_path: &Path, max_page_size: usize) -> Self {
        Self {
            sample: TableState::load(sample_path, "sample"),
            full: TableState::load(full_path, "full"),
            max_page_size,
        }
    }

    pub fn from_tables(sample: DatasetTable, full: DatasetTable, max_page_size: usize) -> Self {
        Self {
            sample: TableState::Loaded(sample),
            full: TableState::Loaded(full),
            max_page_size,
        }
    }

    pub fn table(&self, sample: bool) -> Result<&DatasetTable, DatasetError> {
        let state = if sample { &self.sample } else { &self.full };
        match state {
            TableState::Loaded(table) => Ok(table),
            TableState::Missing(path) => Err(DatasetError::NotFound { path: path.clone() }),
            TableState::Failed(message) => Err(DatasetError::Unreadable(message.clone())),
        }
    }

    pub fn page(&self, sample: bool, page: usize, page_size: usize) -> Result<DatasetPage, DatasetError> {
        self.table(sample)?.page(page, page_size, self.max_page_size)
    }
}
