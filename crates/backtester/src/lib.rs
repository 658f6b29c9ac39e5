//! # Keel Backtester
//!
//! The rule pipeline: a calendar stage selects dates, a filter stage selects
//! securities per date, and a weighting stage assigns weights to whatever
//! survives.
//!
//! ## Architectural Principles
//!
//! - **Immutable Stages:** Each stage takes a `&Dataset` and returns a new
//!   one. Nothing is mutated in place, so a stage failure leaves no partial
//!   state behind.
//! - **Tagged Rules:** Stages dispatch on the rule enums from `core-types`.
//!   A variant a stage does not know surfaces as `UnsupportedRule`.
//! - **Synchronous Core:** The pipeline never suspends. Async hosts run it on
//!   a blocking thread.
//!
//! ## Public API
//!
//! - `BacktestService`: loads a dataset through a provider and runs a request.
//! - `run_pipeline`: the three stages over an already-loaded dataset.
//! - `select_dates`, `select_securities`, `compute_weights`: the stages.
//! - `BacktestError`: the specific error types that can be returned from this crate.

pub mod calendar;
pub mod error;
pub mod filter;
pub mod service;
pub mod weighting;

pub use calendar::select_dates;
pub use error::BacktestError;
pub use filter::select_securities;
pub use service::{BacktestService, run_pipeline};
pub use weighting::{WEIGHT_EPSILON, compute_weights, equal_weights, water_fill};
