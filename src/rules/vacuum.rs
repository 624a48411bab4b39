use super::ValidationRule;
use crate::context::ValidationContext;
use crate::error::{ErrorKind, RuleError};

/// `vacuum_hours` is present, finite, non-negative and at most `max_hours`.
pub struct VacuumHoursCheck {
    max_hours: f64,
}

impl VacuumHoursCheck {
    pub fn new(max_hours: f64) -> Self {
        Self { max_hours }
    }
}

impl ValidationRule for VacuumHoursCheck {
    fn name(&self) -> &'static str {
        "VacuumHoursCheck"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        for (id, spec) in ctx.active_feed_specs()? {
            let hours = spec.vacuum_hours.ok_or_else(|| {
                RuleError::for_dataset(
                    ErrorKind::StructuralViolation,
                    &id,
                    "feed spec does not declare vacuum_hours",
                )
            })?;
            if !hours.is_finite() || hours < 0.0 || hours > self.max_hours {
                return Err(RuleError::for_dataset(
                    ErrorKind::ConfigurationOutOfRange,
                    &id,
                    format!(
                        "vacuum_hours {} is outside the allowed range 0..={}",
                        hours, self.max_hours
                    ),
                ));
            }
        }
        Ok(())
    }
}
