//! Run configuration: an INI-style file parsed into sections, plus the
//! validation settings derived from it.
//!
//! Expected layout:
//!
//! [DEFAULT]
//! file_hunt_path = /data/metadata
//!
//! [FILES]
//! master_spec_name = master_specs.json
//!
//! [VALIDATION]
//! fail_fast = true
//! max_vacuum_hours = 720
//! non_partitionable_types = float, double, binary, array, map, struct

use crate::Result;
use anyhow::{Context, anyhow, bail};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_MAX_VACUUM_HOURS: f64 = 720.0;
pub const DEFAULT_NON_PARTITIONABLE_TYPES: &[&str] =
    &["float", "double", "binary", "array", "map", "struct"];

/// Knobs consumed by individual rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSettings {
    pub max_vacuum_hours: f64,
    /// Column types that may not be used as partition keys.
    pub non_partitionable_types: BTreeSet<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_vacuum_hours: DEFAULT_MAX_VACUUM_HOURS,
            non_partitionable_types: DEFAULT_NON_PARTITIONABLE_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Section name -> key -> value.
pub type Sections = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub base_path: PathBuf,
    pub master_spec_name: String,
    pub fail_fast: bool,
    pub settings: ValidationSettings,
    /// Everything in the file, including sections we don't interpret.
    pub sections: Sections,
}

impl RunConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
        Self::parse(&text, path)
    }

    /// Parse config text. `origin` only appears in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let sections = parse_sections(text, origin)?;
        let lookup = |section: &str, key: &str| -> Option<&str> {
            sections
                .get(section)
                .and_then(|s| s.get(key))
                .map(String::as_str)
        };
        let required = |section: &str, key: &str| -> Result<String> {
            lookup(section, key)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("{}: missing [{}] {}", origin, section, key))
        };

        let base_path = PathBuf::from(required("DEFAULT", "file_hunt_path")?);
        let master_spec_name = required("FILES", "master_spec_name")?;

        let fail_fast = match lookup("VALIDATION", "fail_fast") {
            None => true,
            Some(v) => parse_bool(v)
                .with_context(|| format!("{}: bad [VALIDATION] fail_fast", origin))?,
        };

        let mut settings = ValidationSettings::default();
        if let Some(v) = lookup("VALIDATION", "max_vacuum_hours") {
            let hours: f64 = v
                .parse()
                .with_context(|| format!("{}: bad [VALIDATION] max_vacuum_hours {:?}", origin, v))?;
            if !hours.is_finite() || hours < 0.0 {
                bail!("{}: [VALIDATION] max_vacuum_hours must be >= 0, got {}", origin, v);
            }
            settings.max_vacuum_hours = hours;
        }
        if let Some(v) = lookup("VALIDATION", "non_partitionable_types") {
            settings.non_partitionable_types = v
                .split(',')
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }

        Ok(Self {
            base_path,
            master_spec_name,
            fail_fast,
            settings,
            sections,
        })
    }
}

/// Split INI text into sections. Keys before any header land in `DEFAULT`.
pub fn parse_sections(text: &str, origin: &str) -> Result<Sections> {
    // Capture:
    // header) [NAME]
    // assignment) key = value  (or key: value); value may be empty
    const HEADER_RE: &str = r#"^\s*\[\s*([^\]]+?)\s*\]\s*$"#;
    const ASSIGN_RE: &str = r#"^\s*([A-Za-z0-9_.\-]+)\s*[=:]\s*(.*?)\s*$"#;
    let header = Regex::new(HEADER_RE)?;
    let assign = Regex::new(ASSIGN_RE)?;

    let mut out = Sections::new();
    let mut current = "DEFAULT".to_string();
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(caps) = header.captures(line) {
            current = caps[1].to_string();
            out.entry(current.clone()).or_default();
            continue;
        }

        let Some(caps) = assign.captures(line) else {
            bail!(
                "config parse error at {}:{}: cannot parse line: {:?}",
                origin,
                lno,
                line
            );
        };

        let key = caps[1].to_ascii_lowercase();
        let value = caps[2].to_string();
        if out
            .entry(current.clone())
            .or_default()
            .insert(key.clone(), value)
            .is_some()
        {
            bail!(
                "duplicate key in config at {}:{}: [{}] {}",
                origin,
                lno,
                current,
                key
            );
        }
    }

    Ok(out)
}

fn parse_bool(v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => bail!("expected a boolean, got {:?}", other),
    }
}
