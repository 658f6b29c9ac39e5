use crate::error::DataError;
use core_types::{DataField, Dataset};
use std::collections::HashMap;

/// A source of (date x security) tables, one per data field.
///
/// Implementations must hand out a fresh, independent `Dataset` on every call;
/// the pipeline treats what it receives as read-only and discards it after
/// the run.
pub trait DatasetProvider: Send + Sync {
    /// Loads the table for `field`.
    ///
    /// Returns `DataError::DataUnavailable` when no data exists for the field
    /// and none can be produced.
    fn load(&self, field: DataField) -> Result<Dataset, DataError>;
}

/// A provider backed by datasets held in memory. Useful for tests and for
/// embedding the pipeline without a data directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    datasets: HashMap<DataField, Dataset>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `dataset` for `field`, replacing any previous one.
    pub fn with_dataset(mut self, field: DataField, dataset: Dataset) -> Self {
        self.datasets.insert(field, dataset);
        self
    }
}

impl DatasetProvider for InMemoryProvider {
    fn load(&self, field: DataField) -> Result<Dataset, DataError> {
        self.datasets
            .get(&field)
            .cloned()
            .ok_or(DataError::DataUnavailable { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn returns_registered_dataset_and_rejects_others() {
        let dataset = Dataset::from_values(
            vec![NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()],
            vec!["0".to_string()],
            vec![vec![1.0]],
        )
        .unwrap();
        let provider = InMemoryProvider::new().with_dataset(DataField::Prices, dataset.clone());

        assert_eq!(provider.load(DataField::Prices).unwrap(), dataset);
        assert!(matches!(
            provider.load(DataField::Volume),
            Err(DataError::DataUnavailable {
                field: DataField::Volume
            })
        ));
    }
}
