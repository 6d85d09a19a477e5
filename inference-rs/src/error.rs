//! Error taxonomy for artifact loading and prediction.

use std::path::PathBuf;

/// Errors surfaced by the inference library.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The artifact file does not exist at the expected path.
    #[error("artifact not found: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    /// The artifact exists but cannot be used with this adapter.
    #[error("incompatible artifact {}: {reason}", path.display())]
    ArtifactIncompatible { path: PathBuf, reason: String },

    /// A record is missing a required field or carries a value of the wrong type.
    #[error("malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    /// The categorical value is outside the trained vocabulary.
    #[error("unknown ocean_proximity value {value:?} at row {row}")]
    UnknownCategory { row: usize, value: String },

    /// Tabular input that cannot be read.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Estimator execution failed or produced an unusable value.
    #[error("prediction failed: {0}")]
    Runtime(String),
}

impl InferenceError {
    pub(crate) fn incompatible(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ArtifactIncompatible {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            row,
            reason: reason.into(),
        }
    }

    /// Rebind a record error to its position within a batch.
    pub(crate) fn at_row(self, row: usize) -> Self {
        match self {
            Self::MalformedRecord { reason, .. } => Self::MalformedRecord { row, reason },
            Self::UnknownCategory { value, .. } => Self::UnknownCategory { row, value },
            other => other,
        }
    }
}

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, InferenceError>;
