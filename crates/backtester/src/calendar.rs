use crate::error::BacktestError;
use chrono::NaiveDate;
use core_types::{CalendarRule, Dataset};
use std::collections::HashSet;

/// Reduces the dataset to the rows whose date satisfies `rule`.
///
/// Columns are left untouched; a security with no value on any kept date is
/// still present until the filter stage drops it.
pub fn select_dates(dataset: &Dataset, rule: &CalendarRule) -> Result<Dataset, BacktestError> {
    match rule {
        CalendarRule::CustomDates { dates } => {
            let wanted: HashSet<NaiveDate> = dates.iter().copied().collect();
            Ok(dataset.retain_dates(|date| wanted.contains(&date)))
        }
        CalendarRule::QuarterlyRange { start, end } => {
            if start > end {
                return Err(BacktestError::InvalidRange {
                    start: *start,
                    end: *end,
                });
            }
            Ok(dataset.retain_dates(|date| *start <= date && date <= *end))
        }
        other => Err(BacktestError::unsupported("calendar", other)),
    }
}
