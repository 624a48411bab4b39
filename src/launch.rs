//! System launch validation: the entry point downstream processing calls
//! before touching any dataset.

use crate::config::{RunConfig, ValidationSettings};
use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::loader::{FsMetadataLoader, MetadataLoader};
use crate::rules::{ValidationRule, launch_rules};
use crate::spec::MasterSpecTable;
use crate::validator::Validator;
use std::path::PathBuf;

const LAUNCH_FAILURE: &str = "Something went wrong in system validation";

pub struct SystemLaunchValidator {
    context: ValidationContext,
    settings: ValidationSettings,
    validated: bool,
}

impl SystemLaunchValidator {
    /// Validate `<base_path>/<master_spec_name>` from the filesystem.
    pub fn new(base_path: impl Into<PathBuf>, master_spec_name: impl Into<String>) -> Self {
        Self::with_loader(Box::new(FsMetadataLoader::new(base_path)), master_spec_name)
    }

    pub fn with_loader(
        loader: Box<dyn MetadataLoader>,
        master_spec_name: impl Into<String>,
    ) -> Self {
        Self {
            context: ValidationContext::new(loader, master_spec_name),
            settings: ValidationSettings::default(),
            validated: false,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.base_path.clone(), config.master_spec_name.clone())
            .with_settings(config.settings.clone())
    }

    pub fn with_settings(mut self, settings: ValidationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// The launch rule set, in execution order.
    pub fn rules(&self) -> Vec<Box<dyn ValidationRule>> {
        launch_rules(&self.settings)
    }

    /// Run every launch rule, stopping at the first failure.
    pub fn run(&mut self) -> Result<(), ValidationError> {
        self.run_with(true)
    }

    /// Run every launch rule and report all failures together.
    pub fn run_collect_all(&mut self) -> Result<(), ValidationError> {
        self.run_with(false)
    }

    fn run_with(&mut self, fail_fast: bool) -> Result<(), ValidationError> {
        self.validated = false;
        tracing::info!(
            master_spec = self.context.master_spec_name(),
            fail_fast,
            "starting system launch validation"
        );

        let validator = Validator::new(self.rules(), fail_fast);
        if let Err(err) = validator.validate(&self.context) {
            tracing::error!("system launch validation failed: {}", err);
            return Err(ValidationError::Launch {
                message: LAUNCH_FAILURE.to_string(),
                source: Box::new(err),
            });
        }

        self.validated = true;
        tracing::info!("system launch validation passed");
        Ok(())
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Active rows of the validated table. Fails with `NotValidated` unless
    /// the last `run()` succeeded.
    pub fn get_validated_master_specs(&self) -> Result<MasterSpecTable, ValidationError> {
        if !self.validated {
            return Err(ValidationError::NotValidated);
        }
        let table = self.context.get_master_specs()?;
        Ok(table.filter_active())
    }
}
