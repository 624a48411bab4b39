//! Master specification table.
//!
//! The master spec file is a JSON array with one object per dataset:
//!
//! [
//!   { "dataset_id": "orders", "is_active": true, "feed_specs": "feeds/orders.json" },
//!   ...
//! ]
//!
//! We keep rows as loose column -> value maps so structural rules can report
//! missing or mistyped columns instead of failing at parse time.

use serde::Serialize;
use serde_json::{Map, Value};

pub const DATASET_ID_COLUMN: &str = "dataset_id";
pub const IS_ACTIVE_COLUMN: &str = "is_active";
pub const FEED_SPECS_COLUMN: &str = "feed_specs";

/// One dataset-definition record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MasterSpecRow {
    /// Columns in the order the source object lists them.
    pub values: Map<String, Value>,
}

impl MasterSpecRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column).filter(|v| !v.is_null())
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.get(DATASET_ID_COLUMN).and_then(Value::as_str)
    }

    /// Only a literal JSON `true` counts as active.
    pub fn is_active(&self) -> bool {
        matches!(self.get(IS_ACTIVE_COLUMN), Some(Value::Bool(true)))
    }

    pub fn feed_spec_ref(&self) -> Option<&str> {
        self.get(FEED_SPECS_COLUMN).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for MasterSpecRow {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Ordered collection of dataset records plus the column set seen in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MasterSpecTable {
    /// Union of all row keys, in first-appearance order.
    pub columns: Vec<String>,
    pub rows: Vec<MasterSpecRow>,
}

impl MasterSpecTable {
    pub fn from_rows(rows: Vec<MasterSpecRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.values.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn find(&self, dataset_id: &str) -> Option<&MasterSpecRow> {
        self.rows.iter().find(|r| r.dataset_id() == Some(dataset_id))
    }

    pub fn active_rows(&self) -> impl Iterator<Item = &MasterSpecRow> {
        self.rows.iter().filter(|r| r.is_active())
    }

    /// Dataset ids of active rows, in table order.
    pub fn active_ids(&self) -> Vec<&str> {
        self.active_rows().filter_map(MasterSpecRow::dataset_id).collect()
    }

    /// Copy of the table restricted to active rows. The column set is kept.
    pub fn filter_active(&self) -> MasterSpecTable {
        MasterSpecTable {
            columns: self.columns.clone(),
            rows: self.active_rows().cloned().collect(),
        }
    }
}
