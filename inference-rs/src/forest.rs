//! Native Random Forest regressor.
//!
//! Trees are stored in the parallel-array layout regression-tree libraries
//! export: node `i` has `children_left[i]`, `children_right[i]`, `feature[i]`,
//! `threshold[i]` and `value[i]`. A child index of `-1` marks a leaf.
//!
//! Routing: go left if `x[feature] <= threshold`, otherwise right. A `NaN`
//! input fails the comparison and goes right. The forest output is the mean
//! of the per-tree leaf values.

use crate::artifact;
use crate::error::{InferenceError, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Forest artifact version understood by this crate.
pub const FOREST_FORMAT_VERSION: u32 = 1;

const LEAF: i32 = -1;

/// Serialized form of a single regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

/// Serialized form of a regression forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub format_version: u32,

    /// Width of the input feature vector the forest was fit on
    pub n_features: usize,

    pub trees: Vec<TreeConfig>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: u32,
        right: u32,
    },
    Leaf(f64),
}

/// A validated regression tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Box<[Node]>,
}

impl Tree {
    fn from_config(
        index: usize,
        config: &TreeConfig,
        n_features: usize,
    ) -> std::result::Result<Self, String> {
        let n = config.value.len();
        if n == 0 {
            return Err(format!("tree {index} has no nodes"));
        }
        let lens = [
            config.children_left.len(),
            config.children_right.len(),
            config.feature.len(),
            config.threshold.len(),
        ];
        if lens.iter().any(|&len| len != n) {
            return Err(format!("tree {index} has arrays of unequal length"));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (config.children_left[i], config.children_right[i]);
            let node = match (left, right) {
                (LEAF, LEAF) => {
                    let value = config.value[i];
                    if !value.is_finite() {
                        return Err(format!("tree {index} node {i} has a non-finite leaf value"));
                    }
                    Node::Leaf(value)
                }
                (LEAF, _) | (_, LEAF) => {
                    return Err(format!("tree {index} node {i} has exactly one child"));
                }
                _ => {
                    // Children must point forward, which also rules out cycles.
                    for child in [left, right] {
                        if child <= i as i32 || child as usize >= n {
                            return Err(format!(
                                "tree {index} node {i} references child {child} of {n} nodes"
                            ));
                        }
                    }
                    let feature = config.feature[i];
                    if feature < 0 || feature as usize >= n_features {
                        return Err(format!(
                            "tree {index} node {i} splits on feature {feature} of {n_features}"
                        ));
                    }
                    let threshold = config.threshold[i];
                    if !threshold.is_finite() {
                        return Err(format!("tree {index} node {i} has a non-finite threshold"));
                    }
                    Node::Split {
                        feature: feature as usize,
                        threshold,
                        left: left as u32,
                        right: right as u32,
                    }
                }
            };
            nodes.push(node);
        }

        Ok(Self {
            nodes: nodes.into_boxed_slice(),
        })
    }

    /// Leaf value reached by `features`.
    #[inline]
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] <= threshold {
                        left as usize
                    } else {
                        right as usize
                    };
                }
            }
        }
    }
}

/// An averaging ensemble of regression trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Tree>,
    n_features: usize,
}

impl RandomForest {
    /// Load and validate a forest artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let config: ForestConfig = artifact::read_json(path)?;
        Self::build(config, path)
    }

    /// Validate an in-memory forest description.
    pub fn from_config(config: ForestConfig) -> Result<Self> {
        Self::build(config, Path::new("<memory>"))
    }

    fn build(config: ForestConfig, path: &Path) -> Result<Self> {
        artifact::check_version(path, config.format_version, FOREST_FORMAT_VERSION)?;
        if config.trees.is_empty() {
            return Err(InferenceError::incompatible(PathBuf::from(path), "forest has no trees"));
        }
        let trees = config
            .trees
            .iter()
            .enumerate()
            .map(|(i, t)| Tree::from_config(i, t, config.n_features))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|reason| InferenceError::incompatible(PathBuf::from(path), reason))?;

        Ok(Self {
            trees,
            n_features: config.n_features,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean leaf value over all trees.
    ///
    /// # Panics
    /// If `features` is shorter than [`n_features`](Self::n_features).
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(features)).sum();
        sum / self.trees.len() as f64
    }

    /// Predict every row of `x`, preserving row order.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(InferenceError::Runtime(format!(
                "input has {} features, forest expects {}",
                x.ncols(),
                self.n_features
            )));
        }
        let mut row_buf = vec![0.0; self.n_features];
        let preds = x
            .rows()
            .into_iter()
            .map(|row| {
                // Rows of a non-standard layout are not contiguous.
                let features = match row.as_slice() {
                    Some(s) => s,
                    None => {
                        row_buf.iter_mut().zip(row.iter()).for_each(|(b, v)| *b = *v);
                        &row_buf[..]
                    }
                };
                self.predict_row(features)
            })
            .collect();
        Ok(preds)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::array;

    /// Depth-1 stump: `x[feature] <= threshold` -> `low`, else `high`.
    pub(crate) fn stump(feature: i32, threshold: f64, low: f64, high: f64) -> TreeConfig {
        TreeConfig {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![(low + high) / 2.0, low, high],
        }
    }

    fn forest(trees: Vec<TreeConfig>, n_features: usize) -> ForestConfig {
        ForestConfig {
            format_version: FOREST_FORMAT_VERSION,
            n_features,
            trees,
        }
    }

    #[test]
    fn test_stump_routing() {
        let f = RandomForest::from_config(forest(vec![stump(0, 1.0, 10.0, 20.0)], 2)).unwrap();
        assert_eq!(f.predict_row(&[0.5, 0.0]), 10.0);
        assert_eq!(f.predict_row(&[1.0, 0.0]), 10.0); // threshold is inclusive on the left
        assert_eq!(f.predict_row(&[1.5, 0.0]), 20.0);
    }

    #[test]
    fn test_nan_goes_right() {
        let f = RandomForest::from_config(forest(vec![stump(0, 1.0, 10.0, 20.0)], 1)).unwrap();
        assert_eq!(f.predict_row(&[f64::NAN]), 20.0);
    }

    #[test]
    fn test_forest_averages_trees() {
        let f = RandomForest::from_config(forest(
            vec![stump(0, 1.0, 10.0, 20.0), stump(1, 0.0, 100.0, 200.0)],
            2,
        ))
        .unwrap();
        assert_eq!(f.n_trees(), 2);
        assert_eq!(f.predict_row(&[2.0, -1.0]), (20.0 + 100.0) / 2.0);
    }

    #[test]
    fn test_deeper_tree() {
        // 0: x0 <= 0 ? 1 : 2 ; 1: leaf 1 ; 2: x1 <= 5 ? 3 : 4 ; 3: leaf 3 ; 4: leaf 4
        let tree = TreeConfig {
            children_left: vec![1, -1, 3, -1, -1],
            children_right: vec![2, -1, 4, -1, -1],
            feature: vec![0, -2, 1, -2, -2],
            threshold: vec![0.0, -2.0, 5.0, -2.0, -2.0],
            value: vec![0.0, 1.0, 0.0, 3.0, 4.0],
        };
        let f = RandomForest::from_config(forest(vec![tree], 2)).unwrap();
        let x = array![[-1.0, 9.0], [1.0, 5.0], [1.0, 6.0]];
        assert_eq!(f.predict(x.view()).unwrap(), vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_predict_non_contiguous_rows() {
        let f = RandomForest::from_config(forest(vec![stump(1, 0.0, 1.0, 2.0)], 2)).unwrap();
        let x = array![[5.0, -5.0], [-1.0, 1.0]];
        let xt = x.t();
        // columns of `x` become rows of `xt`: [5, -1] and [-5, 1]
        assert_eq!(f.predict(xt).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_predict_width_mismatch() {
        let f = RandomForest::from_config(forest(vec![stump(0, 1.0, 10.0, 20.0)], 2)).unwrap();
        let x = array![[1.0, 2.0, 3.0]];
        assert!(matches!(f.predict(x.view()), Err(InferenceError::Runtime(_))));
    }

    #[test]
    fn test_rejects_empty_forest() {
        assert!(matches!(
            RandomForest::from_config(forest(vec![], 2)),
            Err(InferenceError::ArtifactIncompatible { .. })
        ));
    }

    #[test]
    fn test_rejects_backward_child() {
        let mut tree = stump(0, 1.0, 10.0, 20.0);
        tree.children_right[0] = 0;
        assert!(RandomForest::from_config(forest(vec![tree], 1)).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_child() {
        let mut tree = stump(0, 1.0, 10.0, 20.0);
        tree.children_left[0] = 7;
        assert!(RandomForest::from_config(forest(vec![tree], 1)).is_err());
    }

    #[test]
    fn test_rejects_half_leaf() {
        let mut tree = stump(0, 1.0, 10.0, 20.0);
        tree.children_left[0] = -1;
        assert!(RandomForest::from_config(forest(vec![tree], 1)).is_err());
    }

    #[test]
    fn test_rejects_feature_out_of_range() {
        assert!(RandomForest::from_config(forest(vec![stump(3, 1.0, 10.0, 20.0)], 3)).is_err());
    }

    #[test]
    fn test_rejects_ragged_arrays() {
        let mut tree = stump(0, 1.0, 10.0, 20.0);
        tree.threshold.pop();
        assert!(RandomForest::from_config(forest(vec![tree], 1)).is_err());
    }

    #[test]
    fn test_rejects_non_finite_leaf() {
        let tree = stump(0, 1.0, f64::INFINITY, 20.0);
        assert!(RandomForest::from_config(forest(vec![tree], 1)).is_err());
    }
}
