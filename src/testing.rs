//! Fixture builders shared by unit tests.

use crate::context::ValidationContext;
use crate::loader::InMemoryLoader;
use crate::spec::{MasterSpecRow, MasterSpecTable};
use serde_json::{Map, Value, json};

/// A feed spec that passes every rule on its own.
pub fn valid_feed_value() -> Value {
    json!({
        "columns": {
            "id": "bigint",
            "name": { "type": "string", "nullable": true },
            "load_date": "date",
            "amount": "double"
        },
        "selection": ["id", "name", "amount"],
        "primary_keys": ["id"],
        "partition_keys": ["load_date"],
        "composite_keys": { "natural": ["name", "load_date"] },
        "vacuum_hours": 24,
        "standard_checks": [
            { "check_type": "not_null", "column": "id" },
            { "check_type": "range", "column": "amount", "min": 0 }
        ],
        "dependencies": []
    })
}

pub fn valid_feed() -> String {
    valid_feed_value().to_string()
}

/// `valid_feed_value()` with top-level fields replaced.
pub fn feed_with(overrides: Value) -> String {
    let mut base = valid_feed_value();
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in overrides {
            base.insert(k.clone(), v.clone());
        }
    }
    base.to_string()
}

pub fn dataset(id: &str, active: bool, feed: &str) -> MasterSpecRow {
    let mut values = Map::new();
    values.insert("dataset_id".to_string(), json!(id));
    values.insert("is_active".to_string(), json!(active));
    values.insert("feed_specs".to_string(), json!(feed));
    MasterSpecRow::from(values)
}

pub fn row(value: Value) -> MasterSpecRow {
    let values = value.as_object().cloned().unwrap_or_default();
    MasterSpecRow::from(values)
}

pub fn table(rows: Vec<MasterSpecRow>) -> MasterSpecTable {
    MasterSpecTable::from_rows(rows)
}

pub fn context(rows: Vec<MasterSpecRow>) -> ValidationContext {
    ValidationContext::new(Box::new(InMemoryLoader::new(table(rows))), "master.json")
}
