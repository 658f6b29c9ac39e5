use crate::error::CoreError;
use chrono::NaiveDate;
use std::collections::HashSet;

/// A two-dimensional table of one data field: rows are dates, columns are
/// security identifiers, and each cell holds a value or is missing.
///
/// Dates are strictly increasing and security identifiers are unique. A
/// `Dataset` is never mutated in place; every transformation returns a new one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    securities: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl Dataset {
    /// Builds a dataset, checking its shape and key invariants.
    ///
    /// NaN cells are normalised to missing.
    pub fn new(
        dates: Vec<NaiveDate>,
        securities: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, CoreError> {
        if rows.len() != dates.len() {
            return Err(CoreError::ShapeMismatch("rows", dates.len(), rows.len()));
        }
        for row in &rows {
            if row.len() != securities.len() {
                return Err(CoreError::ShapeMismatch("columns", securities.len(), row.len()));
            }
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(CoreError::UnorderedDates(pair[1], pair[0]));
            }
        }
        let mut seen = HashSet::with_capacity(securities.len());
        for security in &securities {
            if !seen.insert(security.as_str()) {
                return Err(CoreError::DuplicateSecurity(security.clone()));
            }
        }

        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
            .collect();

        Ok(Self { dates, securities, rows })
    }

    /// Convenience constructor for fully dense tables. NaN marks a missing cell.
    pub fn from_values(
        dates: Vec<NaiveDate>,
        securities: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, CoreError> {
        let rows = values
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
        Self::new(dates, securities, rows)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn securities(&self) -> &[String] {
        &self.securities
    }

    /// The cells of the row at `index`, in column order.
    pub fn row(&self, index: usize) -> &[Option<f64>] {
        &self.rows[index]
    }

    /// Iterates `(date, cells)` pairs in date order.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[Option<f64>])> + '_ {
        self.dates
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Looks up a single cell.
    pub fn value(&self, date: NaiveDate, security: &str) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        let column = self.securities.iter().position(|s| s == security)?;
        self.rows[row][column]
    }

    pub fn height(&self) -> usize {
        self.dates.len()
    }

    pub fn width(&self) -> usize {
        self.securities.len()
    }

    /// True when the table has no dates or no securities.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.securities.is_empty()
    }

    /// Returns a new dataset holding only the rows whose date passes `keep`.
    pub fn retain_dates<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(NaiveDate) -> bool,
    {
        let (dates, rows) = self
            .dates
            .iter()
            .zip(&self.rows)
            .filter(|(date, _)| keep(**date))
            .map(|(date, row)| (*date, row.clone()))
            .unzip();

        Dataset {
            dates,
            securities: self.securities.clone(),
            rows,
        }
    }

    /// Returns a new dataset where every cell whose mask entry is `false`
    /// becomes missing. Columns left without any value are dropped.
    pub fn mask(&self, mask: &[Vec<bool>]) -> Result<Dataset, CoreError> {
        if mask.len() != self.rows.len() {
            return Err(CoreError::ShapeMismatch("mask rows", self.rows.len(), mask.len()));
        }

        let mut rows: Vec<Vec<Option<f64>>> = Vec::with_capacity(self.rows.len());
        for (row, keep) in self.rows.iter().zip(mask) {
            if keep.len() != row.len() {
                return Err(CoreError::ShapeMismatch("mask columns", row.len(), keep.len()));
            }
            rows.push(
                row.iter()
                    .zip(keep)
                    .map(|(cell, &keep)| if keep { *cell } else { None })
                    .collect(),
            );
        }

        let live: Vec<usize> = (0..self.securities.len())
            .filter(|&column| rows.iter().any(|row| row[column].is_some()))
            .collect();

        let securities = live.iter().map(|&c| self.securities[c].clone()).collect();
        let rows = rows
            .into_iter()
            .map(|row| live.iter().map(|&c| row[c]).collect())
            .collect();

        Ok(Dataset {
            dates: self.dates.clone(),
            securities,
            rows,
        })
    }
}

/// The `(column, value)` pairs of the cells present in a row, in column order.
pub fn present_cells(row: &[Option<f64>]) -> impl Iterator<Item = (usize, f64)> + '_ {
    row.iter()
        .enumerate()
        .filter_map(|(column, cell)| cell.map(|value| (column, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Dataset {
        Dataset::from_values(
            vec![day(1), day(2), day(3)],
            ids(&["a", "b"]),
            vec![vec![1.0, 2.0], vec![3.0, f64::NAN], vec![5.0, 6.0]],
        )
        .unwrap()
    }

    #[test]
    fn nan_cells_become_missing() {
        let ds = sample();
        assert_eq!(ds.value(day(2), "a"), Some(3.0));
        assert_eq!(ds.value(day(2), "b"), None);
        assert_eq!(ds.row(1), &[Some(3.0), None]);
    }

    #[test]
    fn rejects_unordered_dates() {
        let values = vec![vec![1.0], vec![2.0]];
        let err = Dataset::from_values(vec![day(2), day(1)], ids(&["a"]), values).unwrap_err();
        assert_eq!(err, CoreError::UnorderedDates(day(1), day(2)));
    }

    #[test]
    fn rejects_duplicate_dates_and_securities() {
        assert!(
            Dataset::from_values(vec![day(1), day(1)], ids(&["a"]), vec![vec![1.0], vec![2.0]])
                .is_err()
        );
        let err = Dataset::from_values(vec![day(1)], ids(&["a", "a"]), vec![vec![1.0, 2.0]])
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateSecurity("a".to_string()));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err =
            Dataset::from_values(vec![day(1)], ids(&["a", "b"]), vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, CoreError::ShapeMismatch("columns", 2, 1)));
    }

    #[test]
    fn retain_dates_keeps_columns() {
        let ds = sample().retain_dates(|d| d != day(2));
        assert_eq!(ds.dates(), &[day(1), day(3)]);
        assert_eq!(ds.securities(), &ids(&["a", "b"]));
        assert_eq!(ds.row(1), &[Some(5.0), Some(6.0)]);
    }

    #[test]
    fn mask_drops_columns_without_values() {
        let ds = sample();
        let mask = vec![vec![true, false], vec![true, true], vec![false, false]];
        let masked = ds.mask(&mask).unwrap();

        // "b" only had a value on day 2, where it was missing already.
        assert_eq!(masked.securities(), &ids(&["a"]));
        assert_eq!(masked.row(0), &[Some(1.0)]);
        assert_eq!(masked.row(2), &[None]);
        assert_eq!(masked.height(), 3);
    }

    #[test]
    fn mask_shape_is_checked() {
        let err = sample().mask(&[vec![true, true]]).unwrap_err();
        assert!(matches!(err, CoreError::ShapeMismatch("mask rows", 3, 1)));
    }

    #[test]
    fn empty_when_no_dates_or_no_securities() {
        assert!(Dataset::default().is_empty());
        assert!(sample().retain_dates(|_| false).is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn present_cells_skip_missing() {
        let cells: Vec<_> = present_cells(&[None, Some(2.0), Some(1.0)]).collect();
        assert_eq!(cells, vec![(1, 2.0), (2, 1.0)]);
    }
}
