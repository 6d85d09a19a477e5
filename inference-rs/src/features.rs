//! Feature preprocessing for model inputs.
//!
//! Applies the fitted preprocessing pipeline persisted at training time:
//! median imputation, derived ratio columns, standard scaling and one-hot
//! encoding of `ocean_proximity`. All fitted state comes from the pipeline
//! artifact; nothing here is reconfigurable at inference time.
//!
//! **Critical for correctness**: the output column layout must match the one
//! the estimator was fit on, or predictions are silently wrong. The
//! estimator's input width is checked against [`Preprocessor::output_width`]
//! on load.

use crate::artifact;
use crate::error::{InferenceError, Result};
use crate::record::{Category, HousingRecord, OceanProximity, CATEGORICAL_FIELD, NUMERIC_FIELDS};
use ndarray::{Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Pipeline artifact version understood by this crate.
pub const PIPELINE_FORMAT_VERSION: u32 = 1;

/// Fitted imputation state for one raw numeric input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericInput {
    /// Column name, must follow the canonical record order
    pub name: String,

    /// Training-set median substituted for missing values
    pub median: f64,
}

/// A `numerator / denominator` column computed from imputed raw inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedRatio {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

/// Fitted standard-scaler parameters over the numeric block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerConfig {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Serialized form of the preprocessing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub format_version: u32,

    /// Raw numeric inputs with their imputation medians
    pub numeric: Vec<NumericInput>,

    /// Ratio columns appended after the raw numeric block
    #[serde(default)]
    pub derived: Vec<DerivedRatio>,

    /// Scaler over raw + derived columns
    pub scaler: ScalerConfig,

    /// One-hot vocabulary for `ocean_proximity`, in encoded column order
    pub categories: Vec<String>,
}

/// What to do with a categorical value outside the fitted vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Fail with `UnknownCategory`.
    #[default]
    Reject,
    /// Encode an all-zero indicator block.
    Ignore,
}

/// A validated, immutable preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    medians: [f64; 8],
    derived: Vec<(usize, usize)>,
    mean: Vec<f64>,
    scale: Vec<f64>,
    categories: Vec<OceanProximity>,
    feature_names: Vec<String>,
}

impl Preprocessor {
    /// Load and validate a pipeline artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let config: PipelineConfig = artifact::read_json(path)?;
        Self::build(config, path)
    }

    /// Validate an in-memory pipeline description.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        Self::build(config, Path::new("<memory>"))
    }

    fn build(config: PipelineConfig, path: &Path) -> Result<Self> {
        let bad = |reason: String| InferenceError::incompatible(PathBuf::from(path), reason);

        artifact::check_version(path, config.format_version, PIPELINE_FORMAT_VERSION)?;

        let names: Vec<&str> = config.numeric.iter().map(|n| n.name.as_str()).collect();
        if names != NUMERIC_FIELDS {
            return Err(bad(format!(
                "numeric inputs {names:?} do not match expected {NUMERIC_FIELDS:?}"
            )));
        }

        let mut medians = [0.0; 8];
        for (slot, input) in medians.iter_mut().zip(&config.numeric) {
            if !input.median.is_finite() {
                return Err(bad(format!("median for `{}` is not finite", input.name)));
            }
            *slot = input.median;
        }

        let column = |name: &str| NUMERIC_FIELDS.iter().position(|f| *f == name);
        let mut derived = Vec::with_capacity(config.derived.len());
        for ratio in &config.derived {
            let unknown = |col: &str| {
                bad(format!("ratio `{}` uses unknown column `{col}`", ratio.name))
            };
            let num = column(&ratio.numerator).ok_or_else(|| unknown(&ratio.numerator))?;
            let den = column(&ratio.denominator).ok_or_else(|| unknown(&ratio.denominator))?;
            derived.push((num, den));
        }

        let numeric_width = NUMERIC_FIELDS.len() + derived.len();
        let ScalerConfig { mean, scale } = config.scaler;
        if mean.len() != numeric_width || scale.len() != numeric_width {
            return Err(bad(format!(
                "scaler has {} means and {} scales, expected {numeric_width}",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(&scale).any(|v| !v.is_finite()) {
            return Err(bad("scaler parameters must be finite".to_string()));
        }
        // Constant columns were fit with a zero scale; the fitting library divides by 1.
        let scale = scale.into_iter().map(|s| if s == 0.0 { 1.0 } else { s }).collect();

        if config.categories.is_empty() {
            return Err(bad("category vocabulary is empty".to_string()));
        }
        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(config.categories.len());
        for label in &config.categories {
            let p = label
                .parse::<OceanProximity>()
                .map_err(|_| bad(format!("unknown category `{label}` in vocabulary")))?;
            if !seen.insert(p) {
                return Err(bad(format!("duplicate category `{label}` in vocabulary")));
            }
            categories.push(p);
        }

        let mut feature_names: Vec<String> = NUMERIC_FIELDS.iter().map(|s| s.to_string()).collect();
        feature_names.extend(config.derived.iter().map(|r| r.name.clone()));
        feature_names.extend(categories.iter().map(|p| format!("{CATEGORICAL_FIELD}_{p}")));

        Ok(Self {
            medians,
            derived,
            mean,
            scale,
            categories,
            feature_names,
        })
    }

    /// Number of columns produced per record.
    pub fn output_width(&self) -> usize {
        self.feature_names.len()
    }

    /// Output column names, in order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Transform records into the estimator's input matrix, one row per record.
    pub fn transform(
        &self,
        records: &[HousingRecord],
        policy: CategoryPolicy,
    ) -> Result<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((records.len(), self.output_width()));
        for (i, (record, row)) in records.iter().zip(out.rows_mut()).enumerate() {
            self.transform_into(record, policy, row).map_err(|e| e.at_row(i))?;
        }
        Ok(out)
    }

    fn transform_into(
        &self,
        record: &HousingRecord,
        policy: CategoryPolicy,
        mut row: ArrayViewMut1<'_, f64>,
    ) -> Result<()> {
        let mut raw = record.numeric_values();
        for (value, median) in raw.iter_mut().zip(self.medians) {
            if value.is_nan() {
                *value = median;
            }
        }

        let numeric_width = self.mean.len();
        for (col, value) in raw.iter().enumerate() {
            row[col] = *value;
        }
        for (k, &(num, den)) in self.derived.iter().enumerate() {
            row[NUMERIC_FIELDS.len() + k] = ratio(raw[num], raw[den]);
        }
        for col in 0..numeric_width {
            row[col] = (row[col] - self.mean[col]) / self.scale[col];
        }

        match self.category_column(&record.ocean_proximity) {
            Some(idx) => row[numeric_width + idx] = 1.0,
            None => match policy {
                CategoryPolicy::Reject => {
                    return Err(InferenceError::UnknownCategory {
                        row: 0,
                        value: record.ocean_proximity.as_str().to_string(),
                    })
                }
                CategoryPolicy::Ignore => {
                    tracing::warn!(
                        value = record.ocean_proximity.as_str(),
                        "unknown ocean_proximity, encoding all-zero indicators"
                    );
                }
            },
        }
        Ok(())
    }

    fn category_column(&self, category: &Category) -> Option<usize> {
        match category {
            Category::Known(p) => self.categories.iter().position(|c| c == p),
            Category::Unknown(_) => None,
        }
    }
}

/// Ratio of two imputed inputs; a zero denominator yields NaN.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}
