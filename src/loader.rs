//! Metadata loading: materialize the master spec table and feed spec text.
//!
//! The engine only talks to a [`MetadataLoader`]. [`FsMetadataLoader`] reads
//! JSON files under a base directory; [`InMemoryLoader`] serves data that
//! some other system already pulled into memory.

use crate::error::{ErrorKind, RuleError};
use crate::spec::{MasterSpecRow, MasterSpecTable};
use serde_json::{Map, Value};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub trait MetadataLoader {
    /// Load the master spec table named `master_spec_name`.
    fn load_master_specs(&self, master_spec_name: &str) -> Result<MasterSpecTable, RuleError>;

    /// Resolve a feed spec reference (as stored in the `feed_specs` column)
    /// to document text.
    fn load_feed_spec(&self, reference: &str) -> Result<String, RuleError>;
}

impl<L: MetadataLoader + ?Sized> MetadataLoader for Rc<L> {
    fn load_master_specs(&self, master_spec_name: &str) -> Result<MasterSpecTable, RuleError> {
        (**self).load_master_specs(master_spec_name)
    }

    fn load_feed_spec(&self, reference: &str) -> Result<String, RuleError> {
        (**self).load_feed_spec(reference)
    }
}

/// Inline documents start with `{`; anything else is a relative path.
pub fn is_inline_document(reference: &str) -> bool {
    reference.trim_start().starts_with('{')
}

/// Parse master spec JSON text (an array of objects) into a table.
pub fn parse_master_specs(text: &str, origin: &str) -> Result<MasterSpecTable, RuleError> {
    let rows: Vec<Map<String, Value>> = serde_json::from_str(text).map_err(|e| {
        RuleError::new(
            ErrorKind::LoadFailure,
            format!("master spec {} is not a JSON array of objects: {}", origin, e),
        )
    })?;
    Ok(MasterSpecTable::from_rows(
        rows.into_iter().map(MasterSpecRow::from).collect(),
    ))
}

#[derive(Debug, Clone)]
pub struct FsMetadataLoader {
    base_path: PathBuf,
}

impl FsMetadataLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read(&self, relative: &str, what: &str) -> Result<String, RuleError> {
        let path = self.base_path.join(relative);
        // The file handle is dropped as soon as the text is in memory.
        fs::read_to_string(&path).map_err(|e| {
            RuleError::new(
                ErrorKind::LoadFailure,
                format!("read {} {}: {}", what, path.display(), e),
            )
        })
    }
}

impl MetadataLoader for FsMetadataLoader {
    fn load_master_specs(&self, master_spec_name: &str) -> Result<MasterSpecTable, RuleError> {
        let text = self.read(master_spec_name, "master spec file")?;
        let table = parse_master_specs(&text, master_spec_name)?;
        tracing::info!(
            path = %self.base_path.join(master_spec_name).display(),
            rows = table.len(),
            "loaded master specs"
        );
        Ok(table)
    }

    fn load_feed_spec(&self, reference: &str) -> Result<String, RuleError> {
        if is_inline_document(reference) {
            return Ok(reference.to_string());
        }
        self.read(reference.trim(), "feed spec file")
    }
}

/// Loader over data that is already in memory.
///
/// Counts loads so callers can observe caching behaviour.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    table: Option<MasterSpecTable>,
    documents: BTreeMap<String, String>,
    master_loads: Cell<usize>,
    feed_loads: Cell<usize>,
}

impl InMemoryLoader {
    pub fn new(table: MasterSpecTable) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }

    /// A loader whose master spec source does not exist.
    pub fn missing() -> Self {
        Self::default()
    }

    /// Register a named document for non-inline references.
    pub fn with_document(mut self, reference: &str, text: &str) -> Self {
        self.documents.insert(reference.to_string(), text.to_string());
        self
    }

    pub fn master_loads(&self) -> usize {
        self.master_loads.get()
    }

    pub fn feed_loads(&self) -> usize {
        self.feed_loads.get()
    }
}

impl MetadataLoader for InMemoryLoader {
    fn load_master_specs(&self, master_spec_name: &str) -> Result<MasterSpecTable, RuleError> {
        self.master_loads.set(self.master_loads.get() + 1);
        self.table.clone().ok_or_else(|| {
            RuleError::new(
                ErrorKind::LoadFailure,
                format!("master spec {} is not available", master_spec_name),
            )
        })
    }

    fn load_feed_spec(&self, reference: &str) -> Result<String, RuleError> {
        self.feed_loads.set(self.feed_loads.get() + 1);
        if is_inline_document(reference) {
            return Ok(reference.to_string());
        }
        self.documents.get(reference).cloned().ok_or_else(|| {
            RuleError::new(
                ErrorKind::LoadFailure,
                format!("feed spec document {} is not available", reference),
            )
        })
    }
}
