//! Wood reference table.
//!
//! Rows have a fixed shape: a unique common name plus the five numeric
//! indices published by the reference dataset. The table is built once by
//! the loader and never mutated afterwards; it is shared as `Arc<WoodTable>`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Header of the key column.
pub const NAME_COLUMN: &str = "Common Name";

/// The numeric indices carried by every reference row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexColumn {
    Strength,
    Janka,
    Moe,
    Mor,
    Crush,
}

impl IndexColumn {
    pub const ALL: [IndexColumn; 5] = [
        IndexColumn::Strength,
        IndexColumn::Janka,
        IndexColumn::Moe,
        IndexColumn::Mor,
        IndexColumn::Crush,
    ];

    /// Column header as it appears in the CSV file.
    pub fn header(&self) -> &'static str {
        match self {
            IndexColumn::Strength => "Strength Index",
            IndexColumn::Janka => "Janka Index",
            IndexColumn::Moe => "MOE Index",
            IndexColumn::Mor => "MOR Index",
            IndexColumn::Crush => "Crush Index",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.header() == header.trim())
    }

    fn position(&self) -> usize {
        match self {
            IndexColumn::Strength => 0,
            IndexColumn::Janka => 1,
            IndexColumn::Moe => 2,
            IndexColumn::Mor => 3,
            IndexColumn::Crush => 4,
        }
    }
}

/// One species in the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRow {
    pub common_name: String,
    /// Index values in `IndexColumn::ALL` order. `None` = empty cell.
    values: [Option<f64>; 5],
}

impl ReferenceRow {
    pub fn new(common_name: impl Into<String>, values: [Option<f64>; 5]) -> Self {
        Self {
            common_name: common_name.into(),
            values,
        }
    }

    pub fn value(&self, column: IndexColumn) -> Option<f64> {
        self.values[column.position()]
    }
}

/// Immutable, name-keyed reference table.
#[derive(Debug, Default)]
pub struct WoodTable {
    rows: Vec<ReferenceRow>,
}

impl WoodTable {
    /// Build a table, keeping the first row for each common name.
    pub fn from_rows(rows: Vec<ReferenceRow>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if seen.insert(row.common_name.clone()) {
                kept.push(row);
            } else {
                log::warn!("duplicate reference row '{}' ignored", row.common_name);
            }
        }
        Self { rows: kept }
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Species names in file order.
    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.common_name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&ReferenceRow> {
        self.rows.iter().find(|r| r.common_name == name)
    }

    /// Rows whose common name equals `name` (zero or one, names are unique).
    pub fn subset(&self, name: &str) -> Vec<ReferenceRow> {
        self.rows
            .iter()
            .filter(|r| r.common_name == name)
            .cloned()
            .collect()
    }

    /// All present values of one column, in row order.
    pub fn column_values(&self, column: IndexColumn) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.value(column)).collect()
    }
}
