//! Wood reference dataset loader.
//!
//! `load` reads the CSV once per path for the life of the process and
//! hands out the same `Arc<WoodTable>` on every later call. Only the name
//! column and the five index columns are kept; their presence is checked
//! up front so a bad file fails at load time, not at first chart.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use woodshu_engine::table::{IndexColumn, ReferenceRow, WoodTable, NAME_COLUMN};
use woodshu_engine::WorkflowError;

use crate::csv::{read_records, Records};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// File could not be opened, decoded or parsed as CSV.
    Io(String),
    /// Header row lacks a required column.
    MissingColumn { path: String, column: String },
    /// A non-empty index cell is not a number.
    BadNumber { row: usize, column: String, value: String },
    /// A row has an empty common name.
    MissingName { row: usize },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "{msg}"),
            Self::MissingColumn { path, column } => {
                write!(f, "{path}: missing column '{column}'")
            }
            Self::BadNumber { row, column, value } => {
                write!(f, "row {row}, column '{column}': cannot parse number '{value}'")
            }
            Self::MissingName { row } => write!(f, "row {row}: empty '{NAME_COLUMN}'"),
        }
    }
}

impl std::error::Error for ReferenceError {}

impl From<ReferenceError> for WorkflowError {
    fn from(err: ReferenceError) -> Self {
        WorkflowError::DataUnavailable(err.to_string())
    }
}

type TableCache = Mutex<HashMap<PathBuf, Arc<WoodTable>>>;

fn cache() -> &'static TableCache {
    static CACHE: OnceLock<TableCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Memoized load. Failed loads are not cached.
pub fn load(path: &Path) -> Result<Arc<WoodTable>, ReferenceError> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut cache = cache().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(table) = cache.get(&key) {
        log::debug!("reference table cache hit: {}", key.display());
        return Ok(Arc::clone(table));
    }

    let table = Arc::new(load_uncached(path)?);
    log::info!("loaded {} wood species from {}", table.len(), path.display());
    cache.insert(key, Arc::clone(&table));
    Ok(table)
}

/// Read and validate the dataset without touching the cache.
pub fn load_uncached(path: &Path) -> Result<WoodTable, ReferenceError> {
    let records = read_records(path).map_err(ReferenceError::Io)?;
    table_from_records(&records, &path.display().to_string())
}

fn table_from_records(records: &Records, source: &str) -> Result<WoodTable, ReferenceError> {
    let missing = |column: &str| ReferenceError::MissingColumn {
        path: source.to_string(),
        column: column.to_string(),
    };
    let name_idx = records.column(NAME_COLUMN).ok_or_else(|| missing(NAME_COLUMN))?;
    let mut index_cols = [0usize; 5];
    for (slot, column) in index_cols.iter_mut().zip(IndexColumn::ALL) {
        *slot = records.column(column.header()).ok_or_else(|| missing(column.header()))?;
    }

    // Semicolon-separated exports come from locales with a decimal comma
    let decimal_comma = records.delimiter == b';';

    let mut rows = Vec::with_capacity(records.rows.len());
    for (i, record) in records.rows.iter().enumerate() {
        // 1-based file row, header is row 1
        let file_row = i + 2;
        let name = record.get(name_idx).map(|s| s.trim()).unwrap_or("");
        if name.is_empty() {
            return Err(ReferenceError::MissingName { row: file_row });
        }

        let mut values = [None; 5];
        for ((value, &col), column) in values.iter_mut().zip(&index_cols).zip(IndexColumn::ALL) {
            let raw = record.get(col).map(|s| s.trim()).unwrap_or("");
            *value = parse_index(raw, decimal_comma).ok_or_else(|| ReferenceError::BadNumber {
                row: file_row,
                column: column.header().to_string(),
                value: raw.to_string(),
            })?;
        }
        rows.push(ReferenceRow::new(name, values));
    }

    Ok(WoodTable::from_rows(rows))
}

/// `Some(None)` for empty cells and the usual NaN spellings, `None` when
/// the cell is not a finite number.
///
/// With `decimal_comma` a comma is the decimal mark (`12,3`); otherwise it
/// is a thousands separator (`1,320`).
fn parse_index(raw: &str, decimal_comma: bool) -> Option<Option<f64>> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("n/a") {
        return Some(None);
    }
    let normalized = if decimal_comma {
        raw.replace(',', ".")
    } else {
        raw.replace(',', "")
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
}
