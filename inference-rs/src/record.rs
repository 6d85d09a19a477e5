//! Housing records: the fixed 9-field input schema.
//!
//! A record carries 8 numeric block statistics and one categorical
//! `ocean_proximity` label. Missing numeric values are stored as `NaN` and
//! imputed later by the preprocessing pipeline; an absent field is an error.

use crate::error::{InferenceError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Names of the numeric input columns, in canonical order.
pub const NUMERIC_FIELDS: [&str; 8] = [
    "longitude",
    "latitude",
    "housing_median_age",
    "total_rooms",
    "total_bedrooms",
    "population",
    "households",
    "median_income",
];

/// Name of the categorical input column.
pub const CATEGORICAL_FIELD: &str = "ocean_proximity";

/// Name of the training target column in tabular files.
pub const TARGET_FIELD: &str = "median_house_value";

/// Proximity of a block to the ocean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OceanProximity {
    #[serde(rename = "<1H OCEAN")]
    LessThanOneHour,
    #[serde(rename = "INLAND")]
    Inland,
    #[serde(rename = "NEAR OCEAN")]
    NearOcean,
    #[serde(rename = "NEAR BAY")]
    NearBay,
    #[serde(rename = "ISLAND")]
    Island,
}

impl OceanProximity {
    /// All labels, in the order the dataset documents them.
    pub const ALL: [OceanProximity; 5] = [
        OceanProximity::LessThanOneHour,
        OceanProximity::Inland,
        OceanProximity::NearOcean,
        OceanProximity::NearBay,
        OceanProximity::Island,
    ];

    /// Dataset spelling of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            OceanProximity::LessThanOneHour => "<1H OCEAN",
            OceanProximity::Inland => "INLAND",
            OceanProximity::NearOcean => "NEAR OCEAN",
            OceanProximity::NearBay => "NEAR BAY",
            OceanProximity::Island => "ISLAND",
        }
    }
}

impl fmt::Display for OceanProximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OceanProximity {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self> {
        OceanProximity::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| InferenceError::UnknownCategory {
                row: 0,
                value: s.to_string(),
            })
    }
}

/// A categorical value as supplied by the caller.
///
/// Out-of-vocabulary labels are kept so the pipeline can decide whether to
/// reject them or zero-fill the indicator block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Known(OceanProximity),
    Unknown(String),
}

impl Category {
    pub fn parse(s: &str) -> Self {
        match s.parse::<OceanProximity>() {
            Ok(p) => Category::Known(p),
            Err(_) => Category::Unknown(s.to_string()),
        }
    }

    /// Parse a caller-supplied label; a blank label is a malformed record.
    pub fn parse_required(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InferenceError::malformed(
                0,
                format!("missing value for `{CATEGORICAL_FIELD}`"),
            ));
        }
        Ok(Self::parse(trimmed))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Known(p) => p.as_str(),
            Category::Unknown(s) => s,
        }
    }
}

impl From<OceanProximity> for Category {
    fn from(p: OceanProximity) -> Self {
        Category::Known(p)
    }
}

/// One census block group.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    pub total_bedrooms: f64,
    pub population: f64,
    pub households: f64,
    /// Median household income, in tens of thousands of dollars.
    pub median_income: f64,
    pub ocean_proximity: Category,
}

impl HousingRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        longitude: f64,
        latitude: f64,
        housing_median_age: f64,
        total_rooms: f64,
        total_bedrooms: f64,
        population: f64,
        households: f64,
        median_income: f64,
        ocean_proximity: impl Into<Category>,
    ) -> Self {
        Self {
            longitude,
            latitude,
            housing_median_age,
            total_rooms,
            total_bedrooms,
            population,
            households,
            median_income,
            ocean_proximity: ocean_proximity.into(),
        }
    }

    /// Build a record from canonical-order numeric values and a label.
    pub fn from_values(numeric: [f64; 8], ocean_proximity: Category) -> Self {
        let [
            longitude,
            latitude,
            housing_median_age,
            total_rooms,
            total_bedrooms,
            population,
            households,
            median_income,
        ] = numeric;
        Self {
            longitude,
            latitude,
            housing_median_age,
            total_rooms,
            total_bedrooms,
            population,
            households,
            median_income,
            ocean_proximity,
        }
    }

    /// Adapt a loosely typed `{name: value}` object.
    ///
    /// Numbers and numeric strings are accepted; `null` marks a missing value.
    /// Keys outside the schema (the target column, ids) are ignored.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self> {
        let mut numeric = [f64::NAN; 8];
        for (slot, name) in numeric.iter_mut().zip(NUMERIC_FIELDS) {
            let value = fields.get(name).ok_or_else(|| {
                InferenceError::malformed(0, format!("missing field `{name}`"))
            })?;
            *slot = numeric_value(name, value)?;
        }

        let label = match fields.get(CATEGORICAL_FIELD) {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(InferenceError::malformed(
                    0,
                    format!("`{CATEGORICAL_FIELD}` must be a string, got {other}"),
                ))
            }
            None => {
                return Err(InferenceError::malformed(
                    0,
                    format!("missing field `{CATEGORICAL_FIELD}`"),
                ))
            }
        };

        Ok(Self::from_values(numeric, Category::parse_required(label)?))
    }

    /// Numeric fields in canonical order.
    pub fn numeric_values(&self) -> [f64; 8] {
        [
            self.longitude,
            self.latitude,
            self.housing_median_age,
            self.total_rooms,
            self.total_bedrooms,
            self.population,
            self.households,
            self.median_income,
        ]
    }
}

/// Check a numeric input value: `NaN` marks a missing value, infinities are rejected.
pub fn check_numeric(name: &str, value: f64) -> Result<f64> {
    if value.is_infinite() {
        return Err(InferenceError::malformed(
            0,
            format!("`{name}` must be finite, got {value}"),
        ));
    }
    Ok(value)
}

/// Parse one numeric cell of a loosely typed record.
fn numeric_value(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => {
            let v = n.as_f64().ok_or_else(|| {
                InferenceError::malformed(0, format!("`{name}` is not representable as f64"))
            })?;
            check_numeric(name, v)
        }
        Value::String(s) => parse_numeric(name, s),
        other => Err(InferenceError::malformed(
            0,
            format!("`{name}` must be numeric, got {other}"),
        )),
    }
}

/// Parse a textual numeric cell; an empty cell is a missing value.
pub(crate) fn parse_numeric(name: &str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    let value = trimmed.parse::<f64>().map_err(|_| {
        InferenceError::malformed(0, format!("`{name}` must be numeric, got {raw:?}"))
    })?;
    check_numeric(name, value)
}
