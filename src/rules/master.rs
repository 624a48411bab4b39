//! Rules over the master spec table itself.

use super::ValidationRule;
use crate::context::ValidationContext;
use crate::error::{ErrorKind, RuleError};
use crate::spec::{DATASET_ID_COLUMN, FEED_SPECS_COLUMN, IS_ACTIVE_COLUMN, MasterSpecRow};
use serde_json::Value;
use std::collections::BTreeSet;

/// The master spec source loads and holds at least one record.
pub struct ValidateMasterSpecs;

impl ValidationRule for ValidateMasterSpecs {
    fn name(&self) -> &'static str {
        "ValidateMasterSpecs"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        let table = ctx.get_master_specs()?;
        if table.is_empty() {
            return Err(RuleError::new(
                ErrorKind::LoadFailure,
                format!("master spec {} contains no records", ctx.master_spec_name()),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Expected {
    NonEmptyString,
    Boolean,
}

impl Expected {
    fn accepts(self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Expected::NonEmptyString, Some(Value::String(s))) => !s.trim().is_empty(),
            (Expected::Boolean, Some(Value::Bool(_))) => true,
            _ => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Expected::NonEmptyString => "a non-empty string",
            Expected::Boolean => "a boolean",
        }
    }
}

const REQUIRED_COLUMNS: &[(&str, Expected)] = &[
    (DATASET_ID_COLUMN, Expected::NonEmptyString),
    (IS_ACTIVE_COLUMN, Expected::Boolean),
    (FEED_SPECS_COLUMN, Expected::NonEmptyString),
];

/// Required columns exist with the right types, and dataset ids are unique.
/// Applies to inactive rows too.
pub struct EnforceMasterSpecsStructure;

impl ValidationRule for EnforceMasterSpecsStructure {
    fn name(&self) -> &'static str {
        "EnforceMasterSpecsStructure"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        let table = ctx.get_master_specs()?;

        for (column, _) in REQUIRED_COLUMNS {
            if !table.has_column(column) {
                return Err(RuleError::new(
                    ErrorKind::StructuralViolation,
                    format!("master spec is missing required column '{}'", column),
                ));
            }
        }

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for (idx, row) in table.rows.iter().enumerate() {
            for (column, expected) in REQUIRED_COLUMNS {
                if !expected.accepts(row.get(column)) {
                    return Err(row_error(
                        row,
                        idx,
                        format!(
                            "column '{}' must be {} (found {})",
                            column,
                            expected.describe(),
                            found(row.get(column))
                        ),
                    ));
                }
            }

            // dataset_id was checked above.
            if let Some(id) = row.dataset_id() {
                if !seen.insert(id) {
                    return Err(row_error(row, idx, "duplicate dataset_id".to_string()));
                }
            }
        }
        Ok(())
    }
}

fn row_error(row: &MasterSpecRow, idx: usize, message: String) -> RuleError {
    let err = RuleError::new(
        ErrorKind::StructuralViolation,
        format!("master spec row {}: {}", idx + 1, message),
    );
    match row.dataset_id() {
        Some(id) if !id.trim().is_empty() => err.with_dataset(id),
        _ => err,
    }
}

fn found(value: Option<&Value>) -> String {
    match value {
        None => "nothing".to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => "an empty string".to_string(),
        Some(v) => v.to_string(),
    }
}

/// Every active dataset's feed spec loads and parses.
pub struct ValidateFeedSpecsJSON;

impl ValidationRule for ValidateFeedSpecsJSON {
    fn name(&self) -> &'static str {
        "ValidateFeedSpecsJSON"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        let specs = ctx.active_feed_specs()?;
        tracing::debug!(count = specs.len(), "feed specs parsed");
        Ok(())
    }
}
