//! Validation context: the data-access layer rules read from.
//!
//! The master spec table is loaded once on first access. Feed specs are
//! parsed on first access per dataset id and cached. The context performs
//! no validation of its own.
//!
//! Caches use `OnceCell`/`RefCell`, so a context has a single writer and
//! must not be shared across threads.

use crate::error::{ErrorKind, RuleError};
use crate::loader::MetadataLoader;
use crate::spec::{FeedSpec, MasterSpecTable};
use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

pub struct ValidationContext {
    loader: Box<dyn MetadataLoader>,
    master_spec_name: String,
    master: OnceCell<MasterSpecTable>,
    feed_specs: RefCell<BTreeMap<String, Rc<FeedSpec>>>,
}

impl ValidationContext {
    pub fn new(loader: Box<dyn MetadataLoader>, master_spec_name: impl Into<String>) -> Self {
        Self {
            loader,
            master_spec_name: master_spec_name.into(),
            master: OnceCell::new(),
            feed_specs: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn master_spec_name(&self) -> &str {
        &self.master_spec_name
    }

    /// The full master spec table. Loads on first call; a failed load is
    /// not remembered, so a later call retries.
    pub fn get_master_specs(&self) -> Result<&MasterSpecTable, RuleError> {
        if let Some(table) = self.master.get() {
            return Ok(table);
        }
        let table = self.loader.load_master_specs(&self.master_spec_name)?;
        Ok(self.master.get_or_init(|| table))
    }

    /// The parsed feed spec for `dataset_id`, from cache or freshly loaded.
    pub fn get_feed_spec(&self, dataset_id: &str) -> Result<Rc<FeedSpec>, RuleError> {
        if let Some(spec) = self.feed_specs.borrow().get(dataset_id) {
            return Ok(Rc::clone(spec));
        }

        let table = self.get_master_specs()?;
        let row = table.find(dataset_id).ok_or_else(|| {
            RuleError::for_dataset(
                ErrorKind::NotFound,
                dataset_id,
                "no master spec record carries this dataset id",
            )
        })?;

        let reference = row
            .feed_spec_ref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                RuleError::for_dataset(
                    ErrorKind::StructuralViolation,
                    dataset_id,
                    "record has no feed spec reference",
                )
            })?;

        let text = self
            .loader
            .load_feed_spec(reference)
            .map_err(|e| e.with_dataset(dataset_id))?;

        let spec = FeedSpec::parse(&text).map_err(|e| {
            RuleError::for_dataset(
                ErrorKind::MalformedDocument,
                dataset_id,
                format!("feed spec is not well-formed: {}", e),
            )
        })?;

        tracing::debug!(dataset = dataset_id, "parsed feed spec");
        let spec = Rc::new(spec);
        self.feed_specs
            .borrow_mut()
            .insert(dataset_id.to_string(), Rc::clone(&spec));
        Ok(spec)
    }

    /// Feed specs of all active datasets, in table order.
    pub fn active_feed_specs(&self) -> Result<Vec<(String, Rc<FeedSpec>)>, RuleError> {
        let table = self.get_master_specs()?;
        let mut out = Vec::new();
        for id in table.active_ids() {
            out.push((id.to_string(), self.get_feed_spec(id)?));
        }
        Ok(out)
    }

    /// Number of feed specs currently cached.
    pub fn cached_feed_specs(&self) -> usize {
        self.feed_specs.borrow().len()
    }
}
