//! Validation rules.
//!
//! Every rule is a single-purpose check over a [`ValidationContext`]. Rules
//! read the context only, and report the first violation they find as a
//! [`RuleError`]. The launch order lives in [`launch_rules`]: structural
//! rules come first, so content rules can rely on a sound table.

use crate::config::ValidationSettings;
use crate::context::ValidationContext;
use crate::error::RuleError;

pub mod checks;
pub mod dependency;
pub mod keys;
pub mod master;
pub mod vacuum;

pub use checks::{CheckType, EnforceStandardChecks, StandardCheckStructureCheck};
pub use dependency::ComprehensiveChecksDependencyDatasetCheck;
pub use keys::{ColumnExistsInSelection, CompositeKeysCheck, PartitionKeysCheck, PrimaryKey};
pub use master::{EnforceMasterSpecsStructure, ValidateFeedSpecsJSON, ValidateMasterSpecs};
pub use vacuum::VacuumHoursCheck;

pub trait ValidationRule {
    /// Stable name used in reports.
    fn name(&self) -> &'static str;

    /// `Ok(())` if the invariant holds across the whole context.
    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError>;
}

/// The launch rule set, in the order it must run.
pub fn launch_rules(settings: &ValidationSettings) -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(ValidateMasterSpecs),
        Box::new(EnforceMasterSpecsStructure),
        Box::new(ValidateFeedSpecsJSON),
        Box::new(PrimaryKey),
        Box::new(ColumnExistsInSelection),
        Box::new(PartitionKeysCheck::new(
            settings.non_partitionable_types.iter().cloned(),
        )),
        Box::new(CompositeKeysCheck),
        Box::new(VacuumHoursCheck::new(settings.max_vacuum_hours)),
        Box::new(EnforceStandardChecks),
        Box::new(StandardCheckStructureCheck),
        Box::new(ComprehensiveChecksDependencyDatasetCheck),
    ]
}

/// First name that appears more than once.
fn first_duplicate(names: &[String]) -> Option<&str> {
    names
        .iter()
        .enumerate()
        .find(|&(i, n)| names[..i].contains(n))
        .map(|(_, n)| n.as_str())
}
