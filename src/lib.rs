//! Launch-time validation of a data pipeline's master specification.
//!
//! A master spec table lists every dataset with an `is_active` flag and a
//! JSON feed spec. Before anything runs, [`SystemLaunchValidator`] loads the
//! table, runs the launch rules in order and, only if they all pass, hands
//! back the active datasets.

pub mod config;
pub mod context;
pub mod error;
pub mod launch;
pub mod loader;
pub mod report;
pub mod rules;
pub mod spec;
pub mod validator;

#[cfg(test)]
mod testing;

pub type Result<T> = anyhow::Result<T>;

pub use config::{RunConfig, ValidationSettings};
pub use context::ValidationContext;
pub use error::{ErrorKind, RuleError, ValidationError};
pub use launch::SystemLaunchValidator;
pub use loader::{FsMetadataLoader, InMemoryLoader, MetadataLoader};
pub use report::{LaunchReport, build_launch_report};
pub use rules::{ValidationRule, launch_rules};
pub use validator::Validator;
