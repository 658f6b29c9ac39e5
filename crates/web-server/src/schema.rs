//! The JSON shapes of the backtest endpoint and their conversion into the
//! typed request the pipeline runs.

use chrono::{NaiveDate, NaiveDateTime};
use core_types::{
    BacktestRequest, BacktestResult, CalendarRule, DataField, FilterRule, WeightTable,
    WeightingRule,
};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarRuleName {
    #[serde(alias = "customer_dates")]
    CustomDates,
    QuarterlyDates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTypeName {
    TopNSecurities,
    FilterByValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMethodName {
    EqualWeight,
    OptimizedWeight,
}

/// A calendar date that also accepts a full timestamp; the time part is
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDate(pub NaiveDate);

impl RequestDate {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|dt| dt.date())
            })
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|dt| dt.date())
            })
            .map(RequestDate)
    }
}

impl<'de> Deserialize<'de> for RequestDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RequestDate::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid date '{raw}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"
            ))
        })
    }
}

/// Body of `POST /v1/backtest`.
///
/// Rule parameters are flat optional fields; [`BacktestRequestBody::validate`]
/// checks that the ones the chosen rules need are present.
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestRequestBody {
    pub data_field: DataField,
    pub calendar_rule: CalendarRuleName,
    pub filter_type: FilterTypeName,
    pub weighting_method: WeightingMethodName,
    #[serde(default)]
    pub list_of_dates: Option<Vec<RequestDate>>,
    #[serde(default)]
    pub initial_date: Option<RequestDate>,
    #[serde(default)]
    pub end_date: Option<RequestDate>,
    #[serde(default)]
    pub top_n: Option<i64>,
    #[serde(default)]
    pub filter_value: Option<f64>,
    #[serde(default)]
    pub weighting_minimum: Option<f64>,
    #[serde(default)]
    pub weighting_maximum: Option<f64>,
}

/// One problem with one request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn required(field: &str, rule: &str) -> Self {
        Self::new(field, format!("required when using {rule}"))
    }
}

impl BacktestRequestBody {
    /// Builds the typed request, collecting every field problem at once.
    ///
    /// Parameters that belong to rules the request did not choose are ignored.
    pub fn validate(self) -> Result<BacktestRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let calendar = match self.calendar_rule {
            CalendarRuleName::CustomDates => match self.list_of_dates {
                Some(dates) if !dates.is_empty() => {
                    Some(CalendarRule::custom_dates(dates.into_iter().map(|d| d.0)))
                }
                Some(_) => {
                    errors.push(FieldError::new("list_of_dates", "must contain at least one date"));
                    None
                }
                None => {
                    errors.push(FieldError::required("list_of_dates", "custom_dates"));
                    None
                }
            },
            CalendarRuleName::QuarterlyDates => match self.initial_date {
                Some(start) => Some(CalendarRule::quarterly_range(
                    start.0,
                    self.end_date.map(|d| d.0),
                )),
                None => {
                    errors.push(FieldError::required("initial_date", "quarterly_dates"));
                    None
                }
            },
        };

        let filter = match self.filter_type {
            FilterTypeName::TopNSecurities => match self.top_n {
                Some(n) => match usize::try_from(n) {
                    Ok(count) if count >= 1 => Some(FilterRule::TopN { count }),
                    _ => {
                        errors.push(FieldError::new("top_n", "must be at least 1"));
                        None
                    }
                },
                None => {
                    errors.push(FieldError::required("top_n", "top_n_securities"));
                    None
                }
            },
            FilterTypeName::FilterByValue => {
                finite(&mut errors, "filter_value", self.filter_value, "filter_by_value")
                    .map(|threshold| FilterRule::ByValue { threshold })
            }
        };

        let weighting = match self.weighting_method {
            WeightingMethodName::EqualWeight => Some(WeightingRule::EqualWeight),
            WeightingMethodName::OptimizedWeight => {
                let rule = "optimized_weight";
                let min = finite(&mut errors, "weighting_minimum", self.weighting_minimum, rule);
                let max = finite(&mut errors, "weighting_maximum", self.weighting_maximum, rule);
                min.zip(max).map(|(min_weight, max_weight)| WeightingRule::OptimizedWeight {
                    min_weight,
                    max_weight,
                })
            }
        };

        match (calendar, filter, weighting) {
            (Some(calendar), Some(filter), Some(weighting)) if errors.is_empty() => {
                Ok(BacktestRequest {
                    data_field: self.data_field,
                    calendar,
                    filter,
                    weighting,
                })
            }
            _ => Err(errors),
        }
    }
}

fn finite(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<f64>,
    rule: &str,
) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(v),
        Some(_) => {
            errors.push(FieldError::new(field, "must be a finite number"));
            None
        }
        None => {
            errors.push(FieldError::required(field, rule));
            None
        }
    }
}

/// Body of a successful backtest response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResponseBody {
    /// Seconds spent in the rule stages.
    pub execution_time: f64,
    pub weights: WeightTable,
}

impl From<BacktestResult> for BacktestResponseBody {
    fn from(result: BacktestResult) -> Self {
        Self {
            execution_time: result.execution_time.as_secs_f64(),
            weights: result.weights,
        }
    }
}
