//! Dummy data synthesis.
//!
//! Produces uniformly distributed values for a fixed universe of securities
//! named `"0"`, `"1"`, ... over every calendar day of a window. The stand-in
//! for a real market-data feed.

use crate::error::DataError;
use crate::parquet::{dataset_path, write_parquet};
use chrono::NaiveDate;
use configuration::DataSettings;
use core_types::{DataField, Dataset};
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};

/// Shape and value range of a synthesized dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub securities: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub value_low: f64,
    pub value_high: f64,
    /// Seeds the generator; each data field derives its own stream from it.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            securities: 1000,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 22).expect("valid date"),
            value_low: 1.0,
            value_high: 100.0,
            seed: None,
        }
    }
}

impl From<&DataSettings> for GeneratorConfig {
    fn from(settings: &DataSettings) -> Self {
        Self {
            securities: settings.securities,
            start_date: settings.start_date,
            end_date: settings.end_date,
            value_low: settings.value_low,
            value_high: settings.value_high,
            seed: settings.seed,
        }
    }
}

impl GeneratorConfig {
    fn check(&self) -> Result<(), DataError> {
        if self.securities == 0 {
            return Err(DataError::Synthesis("at least one security is required".into()));
        }
        if self.start_date > self.end_date {
            return Err(DataError::Synthesis(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        let span_is_finite = self.value_low.is_finite()
            && self.value_high.is_finite()
            && (self.value_high - self.value_low).is_finite();
        if !span_is_finite || !(self.value_low < self.value_high) {
            return Err(DataError::Synthesis(format!(
                "invalid value range [{}, {})",
                self.value_low, self.value_high
            )));
        }
        Ok(())
    }

    fn rng_for(&self, field: DataField) -> StdRng {
        match self.seed {
            Some(seed) => {
                let offset = DataField::ALL
                    .iter()
                    .position(|f| *f == field)
                    .unwrap_or_default() as u64;
                StdRng::seed_from_u64(seed.wrapping_add(offset))
            }
            None => StdRng::from_entropy(),
        }
    }
}

/// Synthesizes the dataset for one data field.
pub fn generate_dataset(config: &GeneratorConfig, field: DataField) -> Result<Dataset, DataError> {
    config.check()?;

    let dates: Vec<NaiveDate> = config
        .start_date
        .iter_days()
        .take_while(|date| *date <= config.end_date)
        .collect();
    let securities: Vec<String> = (0..config.securities).map(|i| i.to_string()).collect();

    let mut rng = config.rng_for(field);
    let values = Uniform::new(config.value_low, config.value_high);
    let rows = dates
        .iter()
        .map(|_| {
            (0..config.securities)
                .map(|_| Some(values.sample(&mut rng)))
                .collect()
        })
        .collect();

    Ok(Dataset::new(dates, securities, rows)?)
}

/// Synthesizes and writes a parquet file for every data field into `dir`.
///
/// `on_written` is called after each file lands, which lets callers report
/// progress. Returns the paths written, in `DataField::ALL` order.
pub fn generate_all<F>(
    config: &GeneratorConfig,
    dir: &Path,
    mut on_written: F,
) -> Result<Vec<PathBuf>, DataError>
where
    F: FnMut(DataField, &Path),
{
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(DataField::ALL.len());
    for field in DataField::ALL {
        let dataset = generate_dataset(config, field)?;
        let path = dataset_path(dir, field);
        write_parquet(&dataset, &path)?;
        tracing::info!(
            %field,
            path = %path.display(),
            dates = dataset.height(),
            securities = dataset.width(),
            "Wrote dummy dataset."
        );
        on_written(field, &path);
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: Option<u64>) -> GeneratorConfig {
        GeneratorConfig {
            securities: 5,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
            value_low: 1.0,
            value_high: 100.0,
            seed,
        }
    }

    #[test]
    fn covers_every_calendar_day_inclusive() {
        let ds = generate_dataset(&small_config(Some(1)), DataField::Prices).unwrap();
        assert_eq!(ds.height(), 10);
        assert_eq!(ds.width(), 5);
        assert_eq!(ds.securities()[0], "0");
        assert_eq!(ds.securities()[4], "4");
        assert_eq!(*ds.dates().last().unwrap(), NaiveDate::from_ymd_opt(2020, 1, 10).unwrap());
    }

    #[test]
    fn values_stay_in_range() {
        let ds = generate_dataset(&small_config(Some(3)), DataField::Volume).unwrap();
        for (_, row) in ds.rows() {
            for cell in row {
                let v = cell.expect("synthesized data is dense");
                assert!((1.0..100.0).contains(&v));
            }
        }
    }

    #[test]
    fn seeded_generation_is_reproducible_per_field() {
        let config = small_config(Some(42));
        let a = generate_dataset(&config, DataField::Prices).unwrap();
        let b = generate_dataset(&config, DataField::Prices).unwrap();
        let c = generate_dataset(&config, DataField::Volume).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_degenerate_configs() {
        let mut config = small_config(None);
        config.securities = 0;
        assert!(matches!(
            generate_dataset(&config, DataField::Prices),
            Err(DataError::Synthesis(_))
        ));

        let mut config = small_config(None);
        config.value_low = 100.0;
        assert!(generate_dataset(&config, DataField::Prices).is_err());
    }

    #[test]
    fn rejects_ranges_the_sampler_cannot_cover() {
        for (low, high) in [(f64::NEG_INFINITY, 100.0), (-1e308, 1e308), (1.0, f64::NAN)] {
            let mut config = small_config(Some(1));
            config.value_low = low;
            config.value_high = high;
            let result = generate_dataset(&config, DataField::Prices);
            assert!(matches!(result, Err(DataError::Synthesis(_))), "[{low}, {high})");
        }
    }

    #[test]
    fn generate_all_writes_one_file_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();
        let paths = generate_all(&small_config(Some(9)), dir.path(), |field, _| seen.push(field))
            .unwrap();

        assert_eq!(paths.len(), 4);
        assert_eq!(seen, DataField::ALL.to_vec());
        for path in paths {
            assert!(path.exists(), "{} missing", path.display());
        }
        assert!(dir.path().join("adtv_3_month.parquet").exists());
    }
}
