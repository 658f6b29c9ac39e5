use crate::error::BacktestError;
use core_types::{Dataset, WeightRow, WeightTable, WeightingRule, present_cells};

/// Tolerance used when checking the floor against the total budget.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// Computes one weight row per date over the securities present on that date.
///
/// A date with no surviving security yields an empty row.
pub fn compute_weights(
    dataset: &Dataset,
    rule: &WeightingRule,
) -> Result<WeightTable, BacktestError> {
    let securities = dataset.securities();
    let mut table = WeightTable::new();

    for (date, row) in dataset.rows() {
        let held: Vec<usize> = present_cells(row).map(|(column, _)| column).collect();
        let weights = match rule {
            WeightingRule::EqualWeight => equal_weights(held.len()),
            WeightingRule::OptimizedWeight { min_weight, max_weight } => {
                water_fill(held.len(), *min_weight, *max_weight)?
            }
            other => return Err(BacktestError::unsupported("weighting", other)),
        };

        let row: WeightRow = held
            .iter()
            .zip(weights)
            .map(|(&column, weight)| (securities[column].clone(), weight))
            .collect();
        table.insert(date, row);
    }

    Ok(table)
}

/// `1 / k` for each of `k` securities; empty when `k` is zero.
pub fn equal_weights(k: usize) -> Vec<f64> {
    if k == 0 {
        return Vec::new();
    }
    vec![1.0 / k as f64; k]
}

/// Bounded water-filling over `k` securities visited in order.
///
/// Every security starts at `min_weight`. The unallocated budget
/// `1 - k * min_weight` is then handed out front to back, raising each
/// security by at most `max_weight - min_weight`, until it runs out.
pub fn water_fill(k: usize, min_weight: f64, max_weight: f64) -> Result<Vec<f64>, BacktestError> {
    check_bound("weighting_minimum", min_weight)?;
    check_bound("weighting_maximum", max_weight)?;

    if min_weight > max_weight {
        return Err(BacktestError::InfeasibleAllocation(format!(
            "minimum weight {min_weight} exceeds maximum weight {max_weight}"
        )));
    }
    if k == 0 {
        return Ok(Vec::new());
    }

    let floor = k as f64 * min_weight;
    if floor > 1.0 + WEIGHT_EPSILON {
        return Err(BacktestError::InfeasibleAllocation(format!(
            "{k} securities at minimum weight {min_weight} need {floor}, more than the full budget"
        )));
    }

    let mut weights = vec![min_weight; k];
    let mut remaining = 1.0 - floor;
    let room = max_weight - min_weight;

    for weight in weights.iter_mut() {
        if remaining <= 0.0 {
            break;
        }
        let additional = room.min(remaining);
        *weight += additional;
        remaining -= additional;
    }

    Ok(weights)
}

fn check_bound(name: &'static str, value: f64) -> Result<(), BacktestError> {
    if !value.is_finite() || value < 0.0 {
        return Err(BacktestError::InvalidParameter {
            name,
            reason: format!("expected a finite, non-negative weight, got {value}"),
        });
    }
    Ok(())
}
