//! Gradient boosting for squared error

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::Regressor;

/// Depth cap for the weak learners
pub const MAX_BOOSTING_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingParams {
    pub n_trees: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    /// Start from the target mean, then fit each tree to the current residuals
    pub fn fit(x: &Array2<f64>, y: ArrayView1<f64>, params: &BoostingParams) -> Self {
        let n = x.nrows();
        let init = if n == 0 { 0.0 } else { y.sum() / n as f64 };
        let tree_params = TreeParams {
            max_depth: params.max_depth.clamp(1, MAX_BOOSTING_DEPTH),
            min_samples_leaf: params.min_samples_leaf,
            max_features: None,
        };

        let indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut current = Array1::from_elem(n, init);
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let residuals = &y - &current;
            let tree = RegressionTree::fit(x, residuals.view(), &indices, &tree_params, &mut rng);

            for (i, row) in x.rows().into_iter().enumerate() {
                current[i] += params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoosting {
    fn predict_row(&self, x: ArrayView1<f64>) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict_row(x))
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rmse;

    #[test]
    fn test_boosting_reduces_error() {
        let x = Array2::from_shape_fn((120, 2), |(i, j)| ((i * (j + 1)) % 23) as f64);
        let y: Array1<f64> = x.rows().into_iter().map(|r| (r[0] - 11.0).powi(2) / 4.0).collect();

        let params = BoostingParams {
            n_trees: 40,
            learning_rate: 0.2,
            max_depth: 3,
            min_samples_leaf: 2,
            seed: 42,
        };
        let model = GradientBoosting::fit(&x, y.view(), &params);
        assert_eq!(model.n_trees(), 40);

        let mean = y.sum() / y.len() as f64;
        let baseline = Array1::from_elem(y.len(), mean);
        let pred = model.predict(&x);
        assert!(rmse(y.view(), pred.view()) < 0.3 * rmse(y.view(), baseline.view()));
    }

    #[test]
    fn test_zero_trees_predicts_mean() {
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let y = Array1::from_vec(vec![1.0, 2.0, 3.0, 6.0]);
        let params = BoostingParams {
            n_trees: 0,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            seed: 0,
        };
        let model = GradientBoosting::fit(&x, y.view(), &params);
        assert_eq!(model.predict_row(x.row(0)), 3.0);
    }
}
