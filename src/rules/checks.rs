//! Standard-check rules.
//!
//! Recognized check types and their required parameters:
//!
//! | check_type              | parameters                                          |
//! |-------------------------|-----------------------------------------------------|
//! | not_null                | column                                              |
//! | unique                  | columns (non-empty)                                 |
//! | accepted_values         | column, values (non-empty)                          |
//! | range                   | column, min and/or max (min <= max)                 |
//! | regex                   | column, pattern (must compile)                      |
//! | row_count               | min >= 0, optional max >= min                       |
//! | freshness               | column, max_age_hours > 0                           |
//! | referential_integrity   | column, reference_dataset, reference_column         |
//!
//! `reference_dataset` / `reference_column` point into another dataset and are
//! resolved by the dependency rule, not here.

use super::ValidationRule;
use crate::context::ValidationContext;
use crate::error::{ErrorKind, RuleError};
use crate::spec::{FeedSpec, StandardCheck};
use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckType {
    NotNull,
    Unique,
    AcceptedValues,
    Range,
    Regex,
    RowCount,
    Freshness,
    ReferentialIntegrity,
}

impl CheckType {
    pub const ALL: [CheckType; 8] = [
        CheckType::NotNull,
        CheckType::Unique,
        CheckType::AcceptedValues,
        CheckType::Range,
        CheckType::Regex,
        CheckType::RowCount,
        CheckType::Freshness,
        CheckType::ReferentialIntegrity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckType::NotNull => "not_null",
            CheckType::Unique => "unique",
            CheckType::AcceptedValues => "accepted_values",
            CheckType::Range => "range",
            CheckType::Regex => "regex",
            CheckType::RowCount => "row_count",
            CheckType::Freshness => "freshness",
            CheckType::ReferentialIntegrity => "referential_integrity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Every active dataset declares at least one standard check.
pub struct EnforceStandardChecks;

impl ValidationRule for EnforceStandardChecks {
    fn name(&self) -> &'static str {
        "EnforceStandardChecks"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        for (id, spec) in ctx.active_feed_specs()? {
            if spec.standard_checks.is_empty() {
                return Err(RuleError::for_dataset(
                    ErrorKind::StructuralViolation,
                    &id,
                    "feed spec declares no standard_checks",
                ));
            }
        }
        Ok(())
    }
}

/// Every standard check has a recognized type and that type's parameters.
pub struct StandardCheckStructureCheck;

impl ValidationRule for StandardCheckStructureCheck {
    fn name(&self) -> &'static str {
        "StandardCheckStructureCheck"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        for (id, spec) in ctx.active_feed_specs()? {
            for (idx, check) in spec.standard_checks.iter().enumerate() {
                CheckShape { spec: &spec, check, idx }
                    .validate()
                    .map_err(|(kind, message)| RuleError::for_dataset(kind, &id, message))?;
            }
        }
        Ok(())
    }
}

type ShapeResult<T> = Result<T, (ErrorKind, String)>;

/// One standard check being inspected, with the document it belongs to.
struct CheckShape<'a> {
    spec: &'a FeedSpec,
    check: &'a StandardCheck,
    idx: usize,
}

impl CheckShape<'_> {
    fn validate(&self) -> ShapeResult<()> {
        let name = self
            .check
            .type_name()
            .ok_or_else(|| self.structural("has no check_type".to_string()))?;
        let check_type = CheckType::from_name(name)
            .ok_or_else(|| self.structural(format!("has unrecognized check_type '{}'", name)))?;

        match check_type {
            CheckType::NotNull => {
                self.local_column("column")?;
            }
            CheckType::Unique => {
                let columns = self.string_list("columns")?;
                for column in columns {
                    self.declared(column)?;
                }
            }
            CheckType::AcceptedValues => {
                self.local_column("column")?;
                match self.check.param("values") {
                    Some(Value::Array(values)) if !values.is_empty() => {}
                    _ => return Err(self.structural(self.expected("values", "a non-empty array"))),
                }
            }
            CheckType::Range => {
                self.local_column("column")?;
                let min = self.optional_number("min")?;
                let max = self.optional_number("max")?;
                match (min, max) {
                    (None, None) => {
                        return Err(self.structural("range requires min or max".to_string()));
                    }
                    (Some(min), Some(max)) if min > max => {
                        return Err(self.structural(format!("range min {} exceeds max {}", min, max)));
                    }
                    _ => {}
                }
            }
            CheckType::Regex => {
                self.local_column("column")?;
                let pattern = self.string("pattern")?;
                Regex::new(pattern).map_err(|e| {
                    self.structural(format!("pattern does not compile: {}", e))
                })?;
            }
            CheckType::RowCount => {
                let min = self.number("min")?;
                if min < 0.0 {
                    return Err(self.structural(self.expected("min", "non-negative")));
                }
                if let Some(max) = self.optional_number("max")? {
                    if max < min {
                        return Err(self.structural(format!("row_count max {} is below min {}", max, min)));
                    }
                }
            }
            CheckType::Freshness => {
                self.local_column("column")?;
                if self.number("max_age_hours")? <= 0.0 {
                    return Err(self.structural(self.expected("max_age_hours", "positive")));
                }
            }
            CheckType::ReferentialIntegrity => {
                self.local_column("column")?;
                self.string("reference_dataset")?;
                self.string("reference_column")?;
            }
        }
        Ok(())
    }

    fn structural(&self, message: String) -> (ErrorKind, String) {
        (
            ErrorKind::StructuralViolation,
            format!("standard check #{} {}", self.idx + 1, message),
        )
    }

    fn expected(&self, param: &str, what: &str) -> String {
        format!("parameter '{}' must be {}", param, what)
    }

    fn string(&self, param: &str) -> ShapeResult<&str> {
        self.check
            .text_param(param)
            .ok_or_else(|| self.structural(self.expected(param, "a non-empty string")))
    }

    fn number(&self, param: &str) -> ShapeResult<f64> {
        self.optional_number(param)?
            .ok_or_else(|| self.structural(self.expected(param, "a number")))
    }

    fn optional_number(&self, param: &str) -> ShapeResult<Option<f64>> {
        match self.check.param(param) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.structural(self.expected(param, "a number"))),
        }
    }

    fn string_list(&self, param: &str) -> ShapeResult<Vec<&str>> {
        let invalid = || self.structural(self.expected(param, "a non-empty array of strings"));
        let values = match self.check.param(param) {
            Some(Value::Array(values)) if !values.is_empty() => values,
            _ => return Err(invalid()),
        };
        values
            .iter()
            .map(|v| v.as_str().ok_or_else(invalid))
            .collect()
    }

    fn local_column(&self, param: &str) -> ShapeResult<()> {
        let column = self.string(param)?;
        self.declared(column)
    }

    fn declared(&self, column: &str) -> ShapeResult<()> {
        if self.spec.has_column(column) {
            return Ok(());
        }
        Err((
            ErrorKind::ReferentialViolation,
            format!(
                "standard check #{} references undeclared column '{}'",
                self.idx + 1,
                column
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, dataset, feed_with, valid_feed};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn structure(checks: serde_json::Value) -> Result<(), RuleError> {
        let ctx = context(vec![dataset(
            "orders",
            true,
            &feed_with(json!({ "standard_checks": checks })),
        )]);
        StandardCheckStructureCheck.validate(&ctx)
    }

    #[test]
    fn check_type_names_round_trip() {
        for t in CheckType::ALL {
            assert_eq!(CheckType::from_name(t.as_str()), Some(t));
        }
        assert_eq!(CheckType::from_name("NOT_NULL"), None);
    }

    #[test]
    fn standard_checks_must_be_declared() {
        let ctx = context(vec![dataset("orders", true, &valid_feed())]);
        EnforceStandardChecks.validate(&ctx).unwrap();

        let ctx = context(vec![
            dataset("orders", true, &valid_feed()),
            dataset("payments", true, &feed_with(json!({"standard_checks": []}))),
        ]);
        let err = EnforceStandardChecks.validate(&ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralViolation);
        assert_eq!(err.dataset.as_deref(), Some("payments"));
    }

    #[test]
    fn accepts_every_well_formed_type() {
        structure(json!([
            { "check_type": "not_null", "column": "id" },
            { "check_type": "unique", "columns": ["id", "name"] },
            { "check_type": "accepted_values", "column": "name", "values": ["a", "b"] },
            { "check_type": "range", "column": "amount", "min": 0, "max": 100 },
            { "check_type": "regex", "column": "name", "pattern": "^[A-Z]+$" },
            { "check_type": "row_count", "min": 1 },
            { "check_type": "freshness", "column": "load_date", "max_age_hours": 48 },
            { "check_type": "referential_integrity", "column": "id",
              "reference_dataset": "customers", "reference_column": "id" }
        ]))
        .unwrap();
    }

    #[test]
    fn missing_or_unknown_type_is_structural() {
        let err = structure(json!([{ "column": "id" }])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralViolation);
        assert!(err.message.contains("no check_type"));

        let err = structure(json!([{ "check_type": "vibes", "column": "id" }])).unwrap_err();
        assert!(err.message.contains("unrecognized check_type 'vibes'"));
    }

    #[test]
    fn missing_parameters_are_structural() {
        let cases = [
            json!({ "check_type": "not_null" }),
            json!({ "check_type": "unique", "columns": [] }),
            json!({ "check_type": "accepted_values", "column": "name" }),
            json!({ "check_type": "range", "column": "amount" }),
            json!({ "check_type": "range", "column": "amount", "min": 5, "max": 1 }),
            json!({ "check_type": "regex", "column": "name", "pattern": "(" }),
            json!({ "check_type": "row_count", "min": -1 }),
            json!({ "check_type": "freshness", "column": "load_date", "max_age_hours": 0 }),
            json!({ "check_type": "referential_integrity", "column": "id" }),
        ];
        for case in cases {
            let err = structure(json!([case])).unwrap_err();
            assert_eq!(err.kind, ErrorKind::StructuralViolation, "{}", case);
        }
    }

    #[test]
    fn undeclared_local_column_is_referential() {
        let err = structure(json!([
            { "check_type": "not_null", "column": "id" },
            { "check_type": "unique", "columns": ["id", "ghost"] }
        ]))
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReferentialViolation);
        assert!(err.message.contains("#2"));
        assert!(err.message.contains("'ghost'"));
    }
}
