//! Error taxonomy for metadata validation.
//!
//! Rules and the context fail with a single [`RuleError`] that carries an
//! [`ErrorKind`], the rule name, the offending dataset and a message.
//! The orchestrator and the launcher lift those into [`ValidationError`],
//! which is the only error type callers see at the boundary.

use std::fmt;

/// What kind of invariant a failure violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// Metadata source missing, unreadable, ill-shaped or empty.
    LoadFailure,
    /// No master-spec row carries the requested dataset id.
    NotFound,
    /// A feed-spec document cannot be parsed.
    MalformedDocument,
    /// Required columns or fields are absent, empty or mistyped.
    StructuralViolation,
    /// A key, column or dependency reference does not resolve.
    ReferentialViolation,
    /// The dependency graph among active datasets has a cycle.
    CyclicDependency,
    /// A numeric setting falls outside its allowed bounds.
    ConfigurationOutOfRange,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::LoadFailure => "LoadFailure",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MalformedDocument => "MalformedDocument",
            ErrorKind::StructuralViolation => "StructuralViolation",
            ErrorKind::ReferentialViolation => "ReferentialViolation",
            ErrorKind::CyclicDependency => "CyclicDependency",
            ErrorKind::ConfigurationOutOfRange => "ConfigurationOutOfRange",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured failure raised by a rule or by the context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}{kind}{}: {message}", rule_prefix(.rule), dataset_suffix(.dataset))]
pub struct RuleError {
    pub kind: ErrorKind,
    /// Stable name of the rule that raised it. The validator fills this in
    /// for errors that bubble up from the context.
    pub rule: Option<String>,
    pub dataset: Option<String>,
    pub message: String,
}

impl RuleError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            rule: None,
            dataset: None,
            message: message.into(),
        }
    }

    pub fn for_dataset(kind: ErrorKind, dataset: &str, message: impl Into<String>) -> Self {
        Self::new(kind, message).with_dataset(dataset)
    }

    pub fn with_dataset(mut self, dataset: &str) -> Self {
        self.dataset = Some(dataset.to_string());
        self
    }

    pub fn with_rule(mut self, rule: &str) -> Self {
        self.rule = Some(rule.to_string());
        self
    }

    /// Attach the rule name only if nothing upstream already did.
    pub fn or_rule(mut self, rule: &str) -> Self {
        if self.rule.is_none() {
            self.rule = Some(rule.to_string());
        }
        self
    }
}

/// Boundary error for validation runs.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// First failure of a fail-fast run.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Every failure of a collect-all run, in rule order.
    #[error("{}", render_aggregate(.0))]
    Aggregate(Vec<RuleError>),

    /// Top-level wrapper produced by the launch validator.
    #[error("{message}")]
    Launch {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Validated output was requested before a successful run.
    #[error("master specs have not been validated; run() must succeed first")]
    NotValidated,
}

impl ValidationError {
    /// Rule failures carried by this error, looking through a launch wrapper.
    pub fn violations(&self) -> Vec<&RuleError> {
        match self {
            ValidationError::Rule(err) => vec![err],
            ValidationError::Aggregate(errs) => errs.iter().collect(),
            ValidationError::Launch { source, .. } => source
                .downcast_ref::<ValidationError>()
                .map(ValidationError::violations)
                .unwrap_or_default(),
            ValidationError::NotValidated => Vec::new(),
        }
    }

    /// Kind of the first rule failure, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.violations().first().map(|err| err.kind)
    }
}

fn rule_prefix(rule: &Option<String>) -> String {
    rule.as_ref()
        .map(|r| format!("[{}] ", r))
        .unwrap_or_default()
}

fn dataset_suffix(dataset: &Option<String>) -> String {
    dataset
        .as_ref()
        .map(|d| format!(" (dataset '{}')", d))
        .unwrap_or_default()
}

fn render_aggregate(errors: &[RuleError]) -> String {
    let mut out = format!("{} validation failure(s)", errors.len());
    for err in errors {
        out.push_str("\n  - ");
        out.push_str(&err.to_string());
    }
    out
}
