//! Random forest: bootstrap-bagged regression trees

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::Regressor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Each tree sees a bootstrap sample and a third of the features per split.
    /// Tree `t` is seeded with `seed + t`.
    pub fn fit(x: &Array2<f64>, y: ArrayView1<f64>, params: &ForestParams) -> Self {
        let n = x.nrows();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_leaf: params.min_samples_leaf,
            max_features: Some((x.ncols() / 3).max(1)),
        };

        let trees = (0..params.n_trees.max(1))
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let sample: Vec<usize> = if n == 0 {
                    Vec::new()
                } else {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                };
                RegressionTree::fit(x, y, &sample, &tree_params, &mut rng)
            })
            .collect();

        Self { trees }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn predict_row(&self, x: ArrayView1<f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_row(x)).sum();
        total / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rmse;
    use ndarray::Array1;

    #[test]
    fn test_forest_beats_mean_baseline() {
        let x = Array2::from_shape_fn((200, 3), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| 2.0 * r[0] + if r[1] > 8.0 { 20.0 } else { 0.0 })
            .collect();

        let params = ForestParams {
            n_trees: 10,
            max_depth: 6,
            min_samples_leaf: 2,
            seed: 42,
        };
        let forest = RandomForest::fit(&x, y.view(), &params);
        assert_eq!(forest.n_trees(), 10);

        let pred = forest.predict(&x);
        let mean = y.sum() / y.len() as f64;
        let baseline = Array1::from_elem(y.len(), mean);

        assert!(rmse(y.view(), pred.view()) < 0.5 * rmse(y.view(), baseline.view()));
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_shape_fn(50, |i| i as f64);
        let params = ForestParams {
            n_trees: 3,
            max_depth: 4,
            min_samples_leaf: 2,
            seed: 7,
        };
        assert_eq!(
            RandomForest::fit(&x, y.view(), &params),
            RandomForest::fit(&x, y.view(), &params)
        );
    }
}
