//! Estimator backends behind a common prediction interface.

use crate::artifact;
use crate::error::Result;
use crate::forest::RandomForest;
use ndarray::ArrayView2;
use std::path::Path;

/// A fitted regression model over preprocessed feature rows.
pub trait Estimator: Send {
    /// Input width the model was fit on, when the artifact declares it.
    fn n_features(&self) -> Option<usize>;

    /// Predict one value per row of `x`, in row order.
    fn predict(&mut self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>>;

    /// Short backend name for logs.
    fn kind(&self) -> &'static str;
}

impl Estimator for RandomForest {
    fn n_features(&self) -> Option<usize> {
        Some(RandomForest::n_features(self))
    }

    fn predict(&mut self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        RandomForest::predict(self, x)
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}

/// Load a model artifact, choosing the backend from the file extension.
///
/// `.onnx` files need the `onnx` feature; anything else is read as a
/// native forest document.
pub fn load_estimator(path: &Path) -> Result<Box<dyn Estimator>> {
    artifact::ensure_exists(path)?;
    let is_onnx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("onnx"));

    if is_onnx {
        load_onnx(path)
    } else {
        Ok(Box::new(RandomForest::load(path)?))
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Box<dyn Estimator>> {
    Ok(Box::new(crate::onnx::OnnxEstimator::load(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Box<dyn Estimator>> {
    Err(crate::error::InferenceError::incompatible(
        path,
        "ONNX models require the `onnx` feature",
    ))
}
