//! Spec layer: JSON shapes for the master spec table and feed specs.
//!
//! This module is intentionally separate from loading and validation.
//! It owns:
//! - the master spec table (rows keyed by column name)
//! - the per-dataset feed spec document

pub mod feed;
pub mod master;

pub use feed::{ColumnDecl, FeedSpec, StandardCheck};
pub use master::{
    DATASET_ID_COLUMN, FEED_SPECS_COLUMN, IS_ACTIVE_COLUMN, MasterSpecRow, MasterSpecTable,
};
