use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of time-series security data. Each field is stored as its own
/// (date x security) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataField {
    MarketCapitalization,
    Prices,
    Volume,
    #[serde(rename = "adtv_3_month")]
    Adtv3Month,
}

impl DataField {
    /// Every known data field, in a stable order.
    pub const ALL: [DataField; 4] = [
        DataField::MarketCapitalization,
        DataField::Prices,
        DataField::Volume,
        DataField::Adtv3Month,
    ];

    /// The identifier used on the wire and as the storage file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataField::MarketCapitalization => "market_capitalization",
            DataField::Prices => "prices",
            DataField::Volume => "volume",
            DataField::Adtv3Month => "adtv_3_month",
        }
    }
}

impl fmt::Display for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| CoreError::UnknownDataField(s.to_string()))
    }
}
