//! Production inference for California house prices.
//!
//! This crate loads a fitted preprocessing pipeline and a fitted Random Forest
//! regressor, both produced offline, and predicts median house values in
//! dollars for 9-field housing records.

pub mod artifact;
pub mod dataset;
pub mod error;
pub mod estimator;
pub mod features;
pub mod forest;
pub mod metrics;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod predictor;
pub mod record;
pub mod report;

pub use dataset::{read_csv, Dataset};
pub use error::{InferenceError, Result};
pub use estimator::{load_estimator, Estimator};
pub use features::{CategoryPolicy, PipelineConfig, Preprocessor};
pub use forest::{ForestConfig, RandomForest, TreeConfig};
pub use metrics::Evaluation;
pub use predictor::{records_from_json, HousePricePredictor, PredictorConfig};
pub use record::{check_numeric, Category, HousingRecord, OceanProximity};
pub use report::format_usd;
