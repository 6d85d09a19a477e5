//! Artifact file access shared by the pipeline and estimator loaders.

use crate::error::{InferenceError, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Fail with `ArtifactMissing` unless `path` names an existing file.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(InferenceError::ArtifactMissing {
            path: path.to_path_buf(),
        })
    }
}

/// Read and deserialize a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    ensure_exists(path)?;
    let bytes = fs::read(path).map_err(|e| InferenceError::incompatible(path, e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| InferenceError::incompatible(path, e.to_string()))
}

/// Check the `format_version` stamp of an artifact.
pub fn check_version(path: &Path, found: u32, supported: u32) -> Result<()> {
    if found == supported {
        Ok(())
    } else {
        Err(InferenceError::incompatible(
            path,
            format!("unsupported format_version {found} (expected {supported})"),
        ))
    }
}
