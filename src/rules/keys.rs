//! Key and column-reference rules. Active datasets only.

use super::{ValidationRule, first_duplicate};
use crate::context::ValidationContext;
use crate::error::{ErrorKind, RuleError};
use std::collections::{BTreeMap, BTreeSet};

/// Primary key is non-empty, free of duplicates, and declared.
pub struct PrimaryKey;

impl ValidationRule for PrimaryKey {
    fn name(&self) -> &'static str {
        "PrimaryKey"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        for (id, spec) in ctx.active_feed_specs()? {
            if spec.primary_keys.is_empty() {
                return Err(RuleError::for_dataset(
                    ErrorKind::StructuralViolation,
                    &id,
                    "feed spec declares no primary key columns",
                ));
            }
            if let Some(column) = spec.undeclared(&spec.primary_keys).first() {
                return Err(RuleError::for_dataset(
                    ErrorKind::ReferentialViolation,
                    &id,
                    format!("primary key column '{}' is not declared in columns", column),
                ));
            }
            if let Some(column) = first_duplicate(&spec.primary_keys) {
                return Err(RuleError::for_dataset(
                    ErrorKind::StructuralViolation,
                    &id,
                    format!("primary key column '{}' is listed more than once", column),
                ));
            }
        }
        Ok(())
    }
}

/// Every selected column is declared. An empty selection means "all columns".
pub struct ColumnExistsInSelection;

impl ValidationRule for ColumnExistsInSelection {
    fn name(&self) -> &'static str {
        "ColumnExistsInSelection"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        for (id, spec) in ctx.active_feed_specs()? {
            if let Some(column) = spec.undeclared(&spec.selection).first() {
                return Err(RuleError::for_dataset(
                    ErrorKind::ReferentialViolation,
                    &id,
                    format!("selected column '{}' is not declared in columns", column),
                ));
            }
        }
        Ok(())
    }
}

/// Partition keys are declared, unique, and not of a non-partitionable type.
pub struct PartitionKeysCheck {
    non_partitionable_types: BTreeSet<String>,
}

impl PartitionKeysCheck {
    /// Type names compare case-insensitively.
    pub fn new(non_partitionable_types: impl IntoIterator<Item = String>) -> Self {
        Self {
            non_partitionable_types: non_partitionable_types
                .into_iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    fn is_partitionable(&self, data_type: &str) -> bool {
        !self
            .non_partitionable_types
            .contains(&data_type.trim().to_ascii_lowercase())
    }
}

impl ValidationRule for PartitionKeysCheck {
    fn name(&self) -> &'static str {
        "PartitionKeysCheck"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        for (id, spec) in ctx.active_feed_specs()? {
            if let Some(column) = spec.undeclared(&spec.partition_keys).first() {
                return Err(RuleError::for_dataset(
                    ErrorKind::ReferentialViolation,
                    &id,
                    format!("partition key column '{}' is not declared in columns", column),
                ));
            }
            if let Some(column) = first_duplicate(&spec.partition_keys) {
                return Err(RuleError::for_dataset(
                    ErrorKind::StructuralViolation,
                    &id,
                    format!("partition key column '{}' is listed more than once", column),
                ));
            }
            for column in &spec.partition_keys {
                let data_type = spec.column_type(column).unwrap_or_default();
                if !self.is_partitionable(data_type) {
                    return Err(RuleError::for_dataset(
                        ErrorKind::StructuralViolation,
                        &id,
                        format!(
                            "partition key column '{}' has non-partitionable type '{}'",
                            column, data_type
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Composite key groups are non-empty, declared, and pairwise distinct.
pub struct CompositeKeysCheck;

impl ValidationRule for CompositeKeysCheck {
    fn name(&self) -> &'static str {
        "CompositeKeysCheck"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        for (id, spec) in ctx.active_feed_specs()? {
            // Column set -> first group that declared it.
            let mut groups: BTreeMap<BTreeSet<&str>, &str> = BTreeMap::new();

            for (group, columns) in &spec.composite_keys {
                if columns.is_empty() {
                    return Err(RuleError::for_dataset(
                        ErrorKind::StructuralViolation,
                        &id,
                        format!("composite key group '{}' has no columns", group),
                    ));
                }
                if let Some(column) = spec.undeclared(columns).first() {
                    return Err(RuleError::for_dataset(
                        ErrorKind::ReferentialViolation,
                        &id,
                        format!(
                            "composite key group '{}' references undeclared column '{}'",
                            group, column
                        ),
                    ));
                }
                if let Some(column) = first_duplicate(columns) {
                    return Err(RuleError::for_dataset(
                        ErrorKind::StructuralViolation,
                        &id,
                        format!(
                            "composite key group '{}' lists column '{}' more than once",
                            group, column
                        ),
                    ));
                }

                let set: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
                if let Some(prev) = groups.insert(set, group.as_str()) {
                    return Err(RuleError::for_dataset(
                        ErrorKind::StructuralViolation,
                        &id,
                        format!("composite key groups '{}' and '{}' are identical", prev, group),
                    ));
                }
            }
        }
        Ok(())
    }
}
