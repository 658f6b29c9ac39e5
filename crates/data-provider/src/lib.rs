//! # Keel Data Provider
//!
//! This crate is the pipeline's only source of data. It turns a `DataField`
//! into a (date x security) `Dataset`.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Adapter:** Storage details (file layout, parquet encoding,
//!   pandas compatibility) stay behind the `DatasetProvider` trait. The
//!   backtester only ever sees a `Dataset` or a `DataError`.
//! - **Fresh Data Per Call:** Every `load` returns an independent dataset, so
//!   concurrent requests never share mutable state.
//! - **Synthesis Is A Provider Policy:** When a file is missing the parquet
//!   provider may generate dummy data; callers only observe
//!   `DataError::DataUnavailable` if nothing can be produced.
//!
//! ## Public API
//!
//! - `DatasetProvider`: the trait the backtester loads through.
//! - `ParquetProvider`: reads `{data_dir}/{field}.parquet`, with optional synthesis.
//! - `InMemoryProvider`: serves datasets registered in memory.
//! - `generate_all` / `generate_dataset`: the dummy-data generator.
//! - `DataError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod generator;
pub mod parquet;
pub mod provider;

// Re-export the key components to create a clean, public-facing API.
pub use error::DataError;
pub use generator::{GeneratorConfig, generate_all, generate_dataset};
pub use parquet::{ParquetProvider, dataset_path, read_parquet, write_parquet};
pub use provider::{DatasetProvider, InMemoryProvider};
