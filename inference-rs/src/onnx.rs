//! ONNX Runtime estimator backend.
//!
//! Expects a graph with one float tensor input of shape `[batch, n_features]`
//! and one output holding a value per row (`[batch]` or `[batch, 1]`).

use crate::error::{InferenceError, Result};
use crate::estimator::Estimator;
use ndarray::{Array2, ArrayView2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Value, ValueType};
use std::path::Path;

/// An exported regressor executed by ONNX Runtime.
pub struct OnnxEstimator {
    session: Session,
    output_name: String,
    n_features: Option<usize>,
}

impl OnnxEstimator {
    /// Open an ONNX model file.
    pub fn load(path: &Path) -> Result<Self> {
        let incompatible = |e: ort::Error| InferenceError::incompatible(path, e.to_string());

        let session = Session::builder()
            .map_err(incompatible)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(incompatible)?
            .with_intra_threads(1) // Single-threaded for determinism
            .map_err(incompatible)?
            .commit_from_file(path)
            .map_err(incompatible)?;

        if session.inputs.len() != 1 || session.outputs.is_empty() {
            return Err(InferenceError::incompatible(
                path,
                format!(
                    "expected 1 input and at least 1 output, graph has {} and {}",
                    session.inputs.len(),
                    session.outputs.len()
                ),
            ));
        }

        // Dynamic dimensions are reported as -1.
        let n_features = match &session.inputs[0].input_type {
            ValueType::Tensor { shape, .. } => shape
                .last()
                .copied()
                .filter(|d| *d > 0)
                .map(|d| d as usize),
            _ => {
                return Err(InferenceError::incompatible(path, "model input is not a tensor"));
            }
        };
        let output_name = session.outputs[0].name.clone();

        Ok(Self {
            session,
            output_name,
            n_features,
        })
    }
}

impl Estimator for OnnxEstimator {
    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict(&mut self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let runtime = |e: ort::Error| InferenceError::Runtime(e.to_string());
        let rows = x.nrows();

        let input: Array2<f32> = x.mapv(|v| v as f32);
        let input_tensor = Value::from_array(input).map_err(runtime)?;
        let outputs = self.session.run(ort::inputs![input_tensor]).map_err(runtime)?;

        let output = outputs.get(&self.output_name).ok_or_else(|| {
            InferenceError::Runtime(format!("missing output `{}`", self.output_name))
        })?;
        let (_, data) = output.try_extract_tensor::<f32>().map_err(runtime)?;
        if data.len() != rows {
            return Err(InferenceError::Runtime(format!(
                "model returned {} values for {rows} rows",
                data.len()
            )));
        }
        Ok(data.iter().map(|&v| f64::from(v)).collect())
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
