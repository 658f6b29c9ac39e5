use crate::enums::DataField;
use chrono::NaiveDate;

/// The end of a `QuarterlyRange` when the caller does not supply one.
pub fn default_range_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 22).expect("2025-01-22 is a valid calendar date")
}

/// Selects which dates participate in a backtest.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CalendarRule {
    /// Keep exactly the listed dates that exist in the dataset.
    CustomDates { dates: Vec<NaiveDate> },
    /// Keep every date in `[start, end]`, both ends inclusive.
    QuarterlyRange { start: NaiveDate, end: NaiveDate },
}

impl CalendarRule {
    pub fn custom_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        CalendarRule::CustomDates {
            dates: dates.into_iter().collect(),
        }
    }

    /// A date range ending at `end`, or at [`default_range_end`] when omitted.
    pub fn quarterly_range(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        CalendarRule::QuarterlyRange {
            start,
            end: end.unwrap_or_else(default_range_end),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CalendarRule::CustomDates { .. } => "custom_dates",
            CalendarRule::QuarterlyRange { .. } => "quarterly_range",
        }
    }
}

/// Selects which securities qualify on each date.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FilterRule {
    /// The `count` highest-valued securities per date.
    TopN { count: usize },
    /// Securities whose value is strictly greater than `threshold`.
    ByValue { threshold: f64 },
}

impl FilterRule {
    pub fn name(&self) -> &'static str {
        match self {
            FilterRule::TopN { .. } => "top_n",
            FilterRule::ByValue { .. } => "by_value",
        }
    }
}

/// Computes the weight of each qualifying security on a date.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum WeightingRule {
    EqualWeight,
    /// Bounded water-filling: every weight ends in `[min_weight, max_weight]`.
    OptimizedWeight { min_weight: f64, max_weight: f64 },
}

impl WeightingRule {
    pub fn name(&self) -> &'static str {
        match self {
            WeightingRule::EqualWeight => "equal_weight",
            WeightingRule::OptimizedWeight { .. } => "optimized_weight",
        }
    }
}

/// A validated backtest request. Built once at the boundary and passed by
/// reference through every pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub data_field: DataField,
    pub calendar: CalendarRule,
    pub filter: FilterRule,
    pub weighting: WeightingRule,
}
