//! Offline regression quality metrics.

use crate::error::{InferenceError, Result};

fn check_lengths(predictions: &[f64], targets: &[f64]) -> Result<()> {
    if predictions.len() == targets.len() {
        Ok(())
    } else {
        Err(InferenceError::InvalidInput(format!(
            "{} predictions for {} targets",
            predictions.len(),
            targets.len()
        )))
    }
}

/// Root mean squared error. Empty input yields 0.
pub fn rmse(predictions: &[f64], targets: &[f64]) -> Result<f64> {
    check_lengths(predictions, targets)?;
    if predictions.is_empty() {
        return Ok(0.0);
    }
    let sum_sq: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    Ok((sum_sq / predictions.len() as f64).sqrt())
}

/// Mean absolute error. Empty input yields 0.
pub fn mae(predictions: &[f64], targets: &[f64]) -> Result<f64> {
    check_lengths(predictions, targets)?;
    if predictions.is_empty() {
        return Ok(0.0);
    }
    let sum_abs: f64 = predictions.iter().zip(targets).map(|(p, t)| (p - t).abs()).sum();
    Ok(sum_abs / predictions.len() as f64)
}

/// Coefficient of determination.
///
/// Constant targets give 1 for a perfect fit and 0 otherwise.
pub fn r2(predictions: &[f64], targets: &[f64]) -> Result<f64> {
    check_lengths(predictions, targets)?;
    if predictions.is_empty() {
        return Ok(0.0);
    }
    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_res: f64 = predictions.iter().zip(targets).map(|(p, t)| (t - p).powi(2)).sum();
    let ss_tot: f64 = targets.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Summary of predictions against known targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub rows: usize,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl Evaluation {
    pub fn compute(predictions: &[f64], targets: &[f64]) -> Result<Self> {
        Ok(Self {
            rows: predictions.len(),
            rmse: rmse(predictions, targets)?,
            mae: mae(predictions, targets)?,
            r2: r2(predictions, targets)?,
        })
    }
}
