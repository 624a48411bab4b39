//! Feed specification document (one per dataset).
//!
//! JSON shape:
//! {
//!   "columns": {
//!     "id": "bigint",                                 // bare type
//!     "name": { "type": "string", "nullable": true }  // or a column object
//!   },
//!   "selection": ["id", "name"],
//!   "primary_keys": ["id"],
//!   "partition_keys": ["load_date"],
//!   "composite_keys": { "natural": ["name", "load_date"] },
//!   "vacuum_hours": 168,
//!   "standard_checks": [ { "check_type": "not_null", "column": "id" } ],
//!   "dependencies": ["customers"]
//! }
//!
//! Parsing only enforces JSON shape. Whether the references inside a
//! document resolve is left to the rules.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedSpec {
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnDecl>,

    #[serde(default)]
    pub selection: Vec<String>,

    #[serde(default)]
    pub primary_keys: Vec<String>,

    #[serde(default)]
    pub partition_keys: Vec<String>,

    #[serde(default)]
    pub composite_keys: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub vacuum_hours: Option<f64>,

    #[serde(default)]
    pub standard_checks: Vec<StandardCheck>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Column declarations in a feed spec.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnDecl {
    // Short shape: "id": "bigint"
    Type(String),
    // Full shape: "id": { "type": "bigint", "nullable": false }
    Detailed {
        #[serde(rename = "type")]
        data_type: String,
        #[serde(default)]
        nullable: Option<bool>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl ColumnDecl {
    pub fn data_type(&self) -> &str {
        match self {
            ColumnDecl::Type(t) | ColumnDecl::Detailed { data_type: t, .. } => t,
        }
    }
}

/// One entry of `standard_checks`. The type is optional at parse time so a
/// missing type is reported as a structural problem rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StandardCheck {
    #[serde(default)]
    pub check_type: Option<String>,

    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl StandardCheck {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|v| !v.is_null())
    }

    /// The declared check type with surrounding whitespace removed.
    /// Blank counts as missing.
    pub fn type_name(&self) -> Option<&str> {
        self.check_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    /// A string parameter, trimmed. Blank counts as missing.
    pub fn text_param(&self, name: &str) -> Option<&str> {
        self.str_param(name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn num_param(&self, name: &str) -> Option<f64> {
        self.param(name).and_then(Value::as_f64)
    }
}

impl FeedSpec {
    /// Parse document text. Anything but a JSON object of the shape above fails.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn column_type(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(ColumnDecl::data_type)
    }

    /// Referenced names (in order) that are not declared in `columns`.
    pub fn undeclared<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        names
            .iter()
            .filter(|n| !self.has_column(n))
            .map(String::as_str)
            .collect()
    }
}
