//! # Keel Core Types
//!
//! The shared vocabulary of the workspace: the (date x security) `Dataset`,
//! the data fields it can be loaded for, the typed rule variants that make up
//! a `BacktestRequest`, and the `WeightTable` the pipeline produces.
//!
//! This is a Layer 0 crate. It has no knowledge of storage, HTTP or logging.

pub mod dataset;
pub mod enums;
pub mod error;
pub mod rules;
pub mod weights;

// Re-export the core types to provide a clean public API.
pub use dataset::{Dataset, present_cells};
pub use enums::DataField;
pub use error::CoreError;
pub use rules::{
    BacktestRequest, CalendarRule, FilterRule, WeightingRule, default_range_end,
};
pub use weights::{BacktestResult, WeightRow, WeightTable};
