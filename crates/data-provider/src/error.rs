use core_types::{CoreError, DataField};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data field {field} does not exist and cannot be generated.")]
    DataUnavailable { field: DataField },

    #[error("Parquet I/O error: {0}")]
    Parquet(String),

    #[error("Stored dataset is invalid: {0}")]
    Validation(String),

    #[error("Dummy data synthesis failed: {0}")]
    Synthesis(String),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset error: {0}")]
    Dataset(#[from] CoreError),
}
