use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Dataset shape mismatch in {0}: expected {1}, found {2}")]
    ShapeMismatch(&'static str, usize, usize),

    #[error("Dataset dates must be strictly increasing, found {0} after {1}")]
    UnorderedDates(NaiveDate, NaiveDate),

    #[error("Duplicate security identifier: {0}")]
    DuplicateSecurity(String),

    #[error("Unknown data field: {0}")]
    UnknownDataField(String),
}
