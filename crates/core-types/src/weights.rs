use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Weights of the securities held on a single date, keyed by security id.
pub type WeightRow = BTreeMap<String, f64>;

/// Date-indexed weights produced by the weighting stage.
///
/// Serializes as `{ "YYYY-MM-DD": { "<security>": weight } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<NaiveDate, WeightRow>);

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, row: WeightRow) {
        self.0.insert(date, row);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&WeightRow> {
        self.0.get(&date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &WeightRow)> {
        self.0.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }

    /// Sum of the weights held on `date`, if the date is present.
    pub fn row_sum(&self, date: NaiveDate) -> Option<f64> {
        self.0.get(&date).map(|row| row.values().sum())
    }

    pub fn into_inner(self) -> BTreeMap<NaiveDate, WeightRow> {
        self.0
    }
}

impl FromIterator<(NaiveDate, WeightRow)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, WeightRow)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The packaged output of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// Wall-clock time spent in the three rule stages (data loading excluded).
    pub execution_time: Duration,
    pub weights: WeightTable,
}
