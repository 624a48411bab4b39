//! Rule orchestration.
//!
//! Runs an ordered rule list against one context, either stopping at the
//! first failure (fail-fast) or running everything and aggregating.

use crate::context::ValidationContext;
use crate::error::{RuleError, ValidationError};
use crate::rules::ValidationRule;

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
    fail_fast: bool,
}

impl Validator {
    pub fn new(rules: Vec<Box<dyn ValidationRule>>, fail_fast: bool) -> Self {
        Self { rules, fail_fast }
    }

    pub fn fail_fast(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self::new(rules, true)
    }

    pub fn collect_all(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self::new(rules, false)
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Rule names in registration order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError> {
        let mut failures: Vec<RuleError> = Vec::new();

        for rule in &self.rules {
            tracing::debug!(rule = rule.name(), "running validation rule");
            let Err(err) = rule.validate(ctx) else {
                continue;
            };

            let err = err.or_rule(rule.name());
            tracing::warn!(rule = rule.name(), "{}", err);
            if self.fail_fast {
                return Err(ValidationError::Rule(err));
            }
            failures.push(err);
        }

        if failures.is_empty() {
            tracing::info!(rules = self.rules.len(), "all validation rules passed");
            Ok(())
        } else {
            Err(ValidationError::Aggregate(failures))
        }
    }
}
