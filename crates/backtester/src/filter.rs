use crate::error::BacktestError;
use core_types::{Dataset, FilterRule, present_cells};

/// Keeps, per date, only the securities that qualify under `rule`.
///
/// A cell that does not qualify becomes missing on that date, and securities
/// that qualify on no date are dropped. Missing cells never qualify.
pub fn select_securities(dataset: &Dataset, rule: &FilterRule) -> Result<Dataset, BacktestError> {
    let mask = match rule {
        FilterRule::TopN { count } => top_n_mask(dataset, *count)?,
        FilterRule::ByValue { threshold } => by_value_mask(dataset, *threshold),
        other => return Err(BacktestError::unsupported("filter", other)),
    };
    Ok(dataset.mask(&mask)?)
}

fn top_n_mask(dataset: &Dataset, count: usize) -> Result<Vec<Vec<bool>>, BacktestError> {
    if count == 0 {
        return Err(BacktestError::InvalidParameter {
            name: "top_n",
            reason: "must be greater than zero".to_string(),
        });
    }

    let mut short_dates = 0usize;
    let mask = dataset
        .rows()
        .map(|(_, row)| {
            let mut ranked: Vec<(usize, f64)> = present_cells(row).collect();
            if ranked.len() < count {
                short_dates += 1;
            }
            // Stable sort: equal values keep their column order.
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

            let mut keep = vec![false; row.len()];
            for (column, _) in ranked.into_iter().take(count) {
                keep[column] = true;
            }
            keep
        })
        .collect();

    if short_dates > 0 {
        tracing::warn!(
            top_n = count,
            dates = short_dates,
            "Fewer securities than top_n on some dates; keeping all available."
        );
    }

    Ok(mask)
}

fn by_value_mask(dataset: &Dataset, threshold: f64) -> Vec<Vec<bool>> {
    dataset
        .rows()
        .map(|(_, row)| {
            row.iter()
                .map(|cell| cell.is_some_and(|value| value > threshold))
                .collect()
        })
        .collect()
}
