//! Parquet-backed dataset store.
//!
//! Layout: `{data_dir}/{data_field}.parquet`, one file per data field, with a
//! `date` column followed by one Float64 column per security. Files written by
//! pandas (date index stored as `__index_level_0__`) are read as well.

use crate::error::DataError;
use crate::generator::{GeneratorConfig, generate_all};
use crate::provider::DatasetProvider;
use chrono::NaiveDate;
use configuration::DataSettings;
use core_types::{DataField, Dataset};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const DATE_COLUMN: &str = "date";
const PANDAS_INDEX_COLUMN: &str = "__index_level_0__";

/// Path of the parquet file holding `field` inside `dir`.
pub fn dataset_path(dir: &Path, field: DataField) -> PathBuf {
    dir.join(format!("{field}.parquet"))
}

/// Loads datasets from parquet files, optionally synthesizing dummy data
/// when a file is missing.
#[derive(Debug)]
pub struct ParquetProvider {
    data_dir: PathBuf,
    synthesis: Option<GeneratorConfig>,
    // At most one synthesis at a time; loaders that lose the race find the
    // files already in place.
    synthesis_lock: Mutex<()>,
}

impl ParquetProvider {
    /// A provider that only reads existing files.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            synthesis: None,
            synthesis_lock: Mutex::new(()),
        }
    }

    /// Enables dummy-data synthesis for missing files.
    pub fn with_synthesis(mut self, config: GeneratorConfig) -> Self {
        self.synthesis = Some(config);
        self
    }

    pub fn from_settings(settings: &DataSettings) -> Self {
        let provider = Self::new(&settings.data_dir);
        if settings.generate_if_missing {
            provider.with_synthesis(GeneratorConfig::from(settings))
        } else {
            provider
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn synthesize(&self, field: DataField) -> Result<(), DataError> {
        let Some(config) = &self.synthesis else {
            return Ok(());
        };

        let _guard = self
            .synthesis_lock
            .lock()
            .map_err(|_| DataError::Synthesis("synthesis lock poisoned".into()))?;

        if dataset_path(&self.data_dir, field).exists() {
            return Ok(());
        }

        tracing::warn!(
            %field,
            data_dir = %self.data_dir.display(),
            "Dataset file missing. Generating dummy data for every data field."
        );
        generate_all(config, &self.data_dir, |_, _| {})?;
        Ok(())
    }
}

impl DatasetProvider for ParquetProvider {
    fn load(&self, field: DataField) -> Result<Dataset, DataError> {
        let path = dataset_path(&self.data_dir, field);

        if !path.exists() {
            if let Err(e) = self.synthesize(field) {
                tracing::error!(%field, error = %e, "Could not synthesize dummy data.");
                return Err(DataError::DataUnavailable { field });
            }
            if !path.exists() {
                return Err(DataError::DataUnavailable { field });
            }
        }

        let dataset = read_parquet(&path)?;
        tracing::debug!(
            %field,
            dates = dataset.height(),
            securities = dataset.width(),
            "Loaded dataset."
        );
        Ok(dataset)
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date")
}

fn parquet_error(context: &'static str) -> impl Fn(PolarsError) -> DataError {
    move |e| DataError::Parquet(format!("{context}: {e}"))
}

/// Writes `dataset` to `path`.
///
/// The file is written next to its destination and renamed into place, so
/// concurrent readers never observe a partial file.
pub fn write_parquet(dataset: &Dataset, path: &Path) -> Result<(), DataError> {
    let epoch = epoch();
    let days: Vec<i32> = dataset
        .dates()
        .iter()
        .map(|date| (*date - epoch).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(dataset.width() + 1);
    columns.push(
        Series::new(DATE_COLUMN, days)
            .cast(&DataType::Date)
            .map_err(parquet_error("date cast"))?,
    );
    for (column, security) in dataset.securities().iter().enumerate() {
        let values: Vec<Option<f64>> = (0..dataset.height())
            .map(|row| dataset.row(row)[column])
            .collect();
        columns.push(Series::new(security.as_str(), values));
    }

    let mut df = DataFrame::new(columns).map_err(parquet_error("dataframe creation"))?;

    replace_atomically(path, |file| {
        ParquetWriter::new(file)
            .finish(&mut df)
            .map(|_| ())
            .map_err(parquet_error("write parquet"))
    })
}

/// Writes `{path}.tmp` with `write`, then renames it over `path`.
///
/// The temporary file is removed whenever any step fails.
fn replace_atomically<F>(path: &Path, write: F) -> Result<(), DataError>
where
    F: FnOnce(fs::File) -> Result<(), DataError>,
{
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)?;

    let result = write(file).and_then(|()| fs::rename(&tmp_path, path).map_err(DataError::Io));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Reads a dataset from `path`. Every non-date column is a security and is
/// cast to Float64; nulls and NaNs become missing cells.
pub fn read_parquet(path: &Path) -> Result<Dataset, DataError> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(parquet_error("read parquet"))?;

    let date_column = [DATE_COLUMN, PANDAS_INDEX_COLUMN]
        .into_iter()
        .find(|name| df.column(name).is_ok())
        .ok_or_else(|| DataError::Validation(format!("missing '{DATE_COLUMN}' column")))?;

    let dates = read_dates(df.column(date_column).map_err(parquet_error("date column"))?)?;

    let mut securities = Vec::with_capacity(df.width().saturating_sub(1));
    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(df.width().saturating_sub(1));
    for series in df.get_columns() {
        if series.name() == date_column {
            continue;
        }
        let values = series
            .cast(&DataType::Float64)
            .map_err(parquet_error("value cast"))?;
        let values = values.f64().map_err(parquet_error("value column type"))?;
        columns.push(values.into_iter().collect());
        securities.push(series.name().to_string());
    }

    let rows = (0..dates.len())
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect();

    Dataset::new(dates, securities, rows).map_err(|e| DataError::Validation(e.to_string()))
}

fn read_dates(series: &Series) -> Result<Vec<NaiveDate>, DataError> {
    let dates = match series.dtype() {
        DataType::Date => series.clone(),
        DataType::Datetime(_, _) => series
            .cast(&DataType::Date)
            .map_err(parquet_error("datetime cast"))?,
        other => {
            return Err(DataError::Validation(format!(
                "date column has unsupported type {other}"
            )));
        }
    };

    let days = dates
        .cast(&DataType::Int32)
        .map_err(parquet_error("date cast"))?;
    let days = days.i32().map_err(parquet_error("date column type"))?;

    let epoch = epoch();
    days.into_iter()
        .enumerate()
        .map(|(row, day)| {
            day.map(|d| epoch + chrono::Duration::days(i64::from(d)))
                .ok_or_else(|| DataError::Validation(format!("null date at row {row}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec![day(1), day(2)],
            vec!["0".to_string(), "1".to_string()],
            vec![vec![Some(10.0), None], vec![Some(30.0), Some(40.0)]],
        )
        .unwrap()
    }

    #[test]
    fn write_and_read_roundtrip_keeps_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dataset_path(dir.path(), DataField::Prices);

        write_parquet(&sample(), &path).unwrap();
        let loaded = read_parquet(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(!path.with_extension("parquet.tmp").exists());
    }

    #[test]
    fn failed_write_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dataset_path(dir.path(), DataField::Volume);

        let result = replace_atomically(&path, |_| Err(DataError::Parquet("disk full".into())));

        assert!(matches!(result, Err(DataError::Parquet(_))));
        assert!(!path.exists());
        assert!(!path.with_extension("parquet.tmp").exists());
    }

    #[test]
    fn failed_rename_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let path = dataset_path(dir.path(), DataField::Volume);
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"").unwrap();

        assert!(matches!(write_parquet(&sample(), &path), Err(DataError::Io(_))));
        assert!(!path.with_extension("parquet.tmp").exists());
    }

    #[test]
    fn reads_pandas_style_datetime_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.parquet");

        let nanos_per_day = 86_400_000_000_000_i64;
        let stamps: Vec<i64> = vec![18262 * nanos_per_day, 18263 * nanos_per_day];
        let index = Series::new(PANDAS_INDEX_COLUMN, stamps)
            .cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))
            .unwrap();
        let mut df = DataFrame::new(vec![Series::new("0", vec![1.5, 2.5]), index]).unwrap();
        ParquetWriter::new(fs::File::create(&path).unwrap())
            .finish(&mut df)
            .unwrap();

        let loaded = read_parquet(&path).unwrap();
        assert_eq!(loaded.dates(), &[day(1), day(2)]);
        assert_eq!(loaded.securities(), &["0".to_string()]);
        assert_eq!(loaded.value(day(2), "0"), Some(2.5));
    }

    #[test]
    fn corrupt_file_is_a_parquet_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.parquet");
        fs::write(&path, b"not parquet").unwrap();

        assert!(matches!(read_parquet(&path), Err(DataError::Parquet(_))));
    }

    #[test]
    fn missing_file_without_synthesis_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ParquetProvider::new(dir.path());

        assert!(matches!(
            provider.load(DataField::Volume),
            Err(DataError::DataUnavailable {
                field: DataField::Volume
            })
        ));
    }

    #[test]
    fn missing_file_is_synthesized_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            securities: 3,
            start_date: day(1),
            end_date: day(4),
            seed: Some(11),
            ..GeneratorConfig::default()
        };
        let provider = ParquetProvider::new(dir.path()).with_synthesis(config);

        let first = provider.load(DataField::MarketCapitalization).unwrap();
        assert_eq!(first.height(), 4);
        assert_eq!(first.width(), 3);

        // Every field was generated in one pass and is now read from disk.
        for field in DataField::ALL {
            assert!(dataset_path(dir.path(), field).exists());
        }
        let again = provider.load(DataField::MarketCapitalization).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn failed_synthesis_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be.
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, b"").unwrap();
        let provider =
            ParquetProvider::new(&blocked).with_synthesis(GeneratorConfig::default());

        assert!(matches!(
            provider.load(DataField::Prices),
            Err(DataError::DataUnavailable { .. })
        ));
    }
}
