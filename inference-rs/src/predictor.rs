//! House price inference interface.
//!
//! Provides the main HousePricePredictor struct: it loads the preprocessing
//! pipeline and estimator artifacts once and maps housing records to
//! predicted median house values in dollars.

use crate::error::{InferenceError, Result};
use crate::estimator::{load_estimator, Estimator};
use crate::features::{CategoryPolicy, Preprocessor};
use crate::record::HousingRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Configuration for the house price predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Path to the fitted estimator artifact
    pub model_path: PathBuf,

    /// Path to the fitted preprocessing pipeline artifact
    pub pipeline_path: PathBuf,

    /// Handling of `ocean_proximity` values outside the trained vocabulary
    pub unknown_category: CategoryPolicy,

    /// Clamp negative predictions to zero
    pub clamp_non_negative: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("house_price_model.json"),
            pipeline_path: PathBuf::from("preprocessing_pipeline.json"),
            unknown_category: CategoryPolicy::Reject,
            clamp_non_negative: true,
        }
    }
}

impl PredictorConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Loaded pipeline + estimator pair.
pub struct HousePricePredictor {
    preprocessor: Preprocessor,
    estimator: Box<dyn Estimator>,
    config: PredictorConfig,
}

impl HousePricePredictor {
    /// Load both artifacts named by `config`.
    ///
    /// # Errors
    /// `ArtifactMissing` if either file is absent, `ArtifactIncompatible` if
    /// either fails to deserialize or the estimator's input width differs
    /// from the pipeline's output width.
    ///
    /// # Example
    /// ```no_run
    /// use house_price_inference::{HousePricePredictor, PredictorConfig};
    ///
    /// let predictor = HousePricePredictor::load(PredictorConfig::default()).unwrap();
    /// ```
    pub fn load(config: PredictorConfig) -> Result<Self> {
        for path in [&config.model_path, &config.pipeline_path] {
            crate::artifact::ensure_exists(path)?;
        }

        let preprocessor = Preprocessor::load(&config.pipeline_path)?;
        tracing::info!(
            path = %config.pipeline_path.display(),
            features = preprocessor.output_width(),
            "pipeline loaded"
        );

        let estimator = load_estimator(&config.model_path)?;
        tracing::info!(
            path = %config.model_path.display(),
            kind = estimator.kind(),
            "model loaded"
        );

        Self::from_parts(preprocessor, estimator, config)
    }

    /// Assemble a predictor from already-loaded parts.
    pub fn from_parts(
        preprocessor: Preprocessor,
        estimator: Box<dyn Estimator>,
        config: PredictorConfig,
    ) -> Result<Self> {
        if let Some(n) = estimator.n_features() {
            if n != preprocessor.output_width() {
                return Err(InferenceError::incompatible(
                    &config.model_path,
                    format!(
                        "model expects {n} features, pipeline produces {}",
                        preprocessor.output_width()
                    ),
                ));
            }
        }
        Ok(Self {
            preprocessor,
            estimator,
            config,
        })
    }

    /// Predict the value of a single record.
    pub fn predict_one(&mut self, record: &HousingRecord) -> Result<f64> {
        let preds = self.predict_batch(std::slice::from_ref(record))?;
        preds
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::Runtime("model returned no prediction".to_string()))
    }

    /// Predict every record, preserving input order.
    pub fn predict_batch(&mut self, records: &[HousingRecord]) -> Result<Vec<f64>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let x = self
            .preprocessor
            .transform(records, self.config.unknown_category)?;
        let mut preds = self.estimator.predict(x.view())?;
        tracing::debug!(rows = records.len(), "batch predicted");

        if preds.len() != records.len() {
            return Err(InferenceError::Runtime(format!(
                "model returned {} predictions for {} rows",
                preds.len(),
                records.len()
            )));
        }
        for (row, p) in preds.iter_mut().enumerate() {
            if !p.is_finite() {
                return Err(InferenceError::Runtime(format!("non-finite prediction at row {row}")));
            }
            if self.config.clamp_non_negative && *p < 0.0 {
                *p = 0.0;
            }
        }
        Ok(preds)
    }

    /// Predict from a loosely typed `{name: value}` object.
    pub fn predict_fields(&mut self, fields: &Map<String, Value>) -> Result<f64> {
        let record = HousingRecord::from_fields(fields)?;
        self.predict_one(&record)
    }

    /// Predict from a JSON object or an array of objects.
    pub fn predict_json(&mut self, value: &Value) -> Result<Vec<f64>> {
        let records = records_from_json(value)?;
        self.predict_batch(&records)
    }
}

/// Adapt a JSON object or array of objects into records.
pub fn records_from_json(value: &Value) -> Result<Vec<HousingRecord>> {
    match value {
        Value::Object(fields) => Ok(vec![HousingRecord::from_fields(fields)?]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(fields) => {
                    HousingRecord::from_fields(fields).map_err(|e| e.at_row(i))
                }
                other => Err(InferenceError::malformed(
                    i,
                    format!("expected an object, got {other}"),
                )),
            })
            .collect(),
        other => Err(InferenceError::malformed(
            0,
            format!("expected an object or an array of objects, got {other}"),
        )),
    }
}
