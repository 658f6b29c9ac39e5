use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("The {stage} stage cannot apply rule '{rule}'.")]
    UnsupportedRule { stage: &'static str, rule: String },

    #[error("Invalid date range: start {start} is after end {end}.")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Infeasible allocation: {0}")]
    InfeasibleAllocation(String),

    #[error("Data provider error: {0}")]
    Data(#[from] data_provider::DataError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] core_types::CoreError),
}

impl BacktestError {
    pub(crate) fn unsupported(stage: &'static str, rule: impl std::fmt::Debug) -> Self {
        BacktestError::UnsupportedRule {
            stage,
            rule: format!("{rule:?}"),
        }
    }
}
