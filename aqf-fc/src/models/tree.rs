//! CART regression tree
//!
//! Splits minimize the summed squared error of the two children (variance
//! reduction). Nodes live in a flat vector; index 0 is the root.

use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Regressor;

/// Minimum improvement in the split score for a split to be kept
const MIN_GAIN: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_samples_leaf: 5,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
}

impl RegressionTree {
    /// Fit on the rows of `x` selected by `indices`
    ///
    /// `indices` may repeat rows (bootstrap samples).
    pub fn fit(
        x: &Array2<f64>,
        y: ArrayView1<f64>,
        indices: &[usize],
        params: &TreeParams,
        rng: &mut impl Rng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut indices = indices.to_vec();
        if indices.is_empty() {
            tree.nodes.push(Node::Leaf { value: 0.0 });
            return tree;
        }
        tree.build(x, y, &mut indices, 0, params, rng);
        tree
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    fn build(
        &mut self,
        x: &Array2<f64>,
        y: ArrayView1<f64>,
        indices: &mut [usize],
        depth: usize,
        params: &TreeParams,
        rng: &mut impl Rng,
    ) -> usize {
        let n = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n as f64;

        let min_leaf = params.min_samples_leaf.max(1);
        if depth >= params.max_depth || n < 2 * min_leaf {
            return self.push(Node::Leaf { value: mean });
        }

        let Some(split) = best_split(x, y, indices, min_leaf, params.max_features, rng) else {
            return self.push(Node::Leaf { value: mean });
        };

        let mid = partition(indices, |i| x[[i, split.feature]] <= split.threshold);
        let node = self.push(Node::Leaf { value: mean });

        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.build(x, y, left_indices, depth + 1, params, rng);
        let right = self.build(x, y, right_indices, depth + 1, params, rng);

        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

impl Regressor for RegressionTree {
    fn predict_row(&self, x: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }
}

/// Reorder `indices` so rows matching `pred` come first; returns the split point
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for k in 0..indices.len() {
        if pred(indices[k]) {
            indices.swap(mid, k);
            mid += 1;
        }
    }
    mid
}

fn best_split(
    x: &Array2<f64>,
    y: ArrayView1<f64>,
    indices: &[usize],
    min_leaf: usize,
    max_features: Option<usize>,
    rng: &mut impl Rng,
) -> Option<BestSplit> {
    let n = indices.len();
    let n_features = x.ncols();

    let candidates: Vec<usize> = match max_features {
        Some(k) if k > 0 && k < n_features => index::sample(rng, n_features, k).into_vec(),
        _ => (0..n_features).collect(),
    };

    let total: f64 = indices.iter().map(|&i| y[i]).sum();
    // Maximizing Σ²/n over both children minimizes the children's squared error
    let parent_score = total * total / n as f64;

    let mut best: Option<BestSplit> = None;
    let mut best_score = parent_score + MIN_GAIN;
    let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);

    for feature in candidates {
        column.clear();
        column.extend(indices.iter().map(|&i| (x[[i, feature]], y[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += column[k].1;
            let left_n = k + 1;
            let right_n = n - left_n;
            if left_n < min_leaf {
                continue;
            }
            if right_n < min_leaf {
                break;
            }
            if column[k].0 == column[k + 1].0 {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;
            if score > best_score {
                best_score = score;
                best = Some(BestSplit {
                    feature,
                    threshold: (column[k].0 + column[k + 1].0) / 2.0,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        // y = 10 when x0 > 5, else 0; x1 is noise
        let mut x = Array2::<f64>::zeros((40, 2));
        let mut y = Array1::<f64>::zeros(40);
        for i in 0..40 {
            x[[i, 0]] = i as f64 / 4.0;
            x[[i, 1]] = ((i * 7) % 11) as f64;
            y[i] = if x[[i, 0]] > 5.0 { 10.0 } else { 0.0 };
        }
        (x, y)
    }

    #[test]
    fn test_learns_step_function() {
        let (x, y) = step_data();
        let indices: Vec<usize> = (0..40).collect();
        let params = TreeParams {
            max_depth: 3,
            min_samples_leaf: 2,
            max_features: None,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, y.view(), &indices, &params, &mut rng);

        assert_eq!(tree.predict_row(array![1.0, 3.0].view()), 0.0);
        assert_eq!(tree.predict_row(array![9.0, 3.0].view()), 10.0);
        // A single split separates the data perfectly
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![5.0, 5.0, 5.0, 5.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, y.view(), &[0, 1, 2, 3], &TreeParams::default(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(array![100.0].view()), 5.0);
    }

    #[test]
    fn test_depth_and_leaf_size_limits() {
        let x = Array2::from_shape_fn((64, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(64, |i| (i as f64).powi(2));
        let indices: Vec<usize> = (0..64).collect();
        let params = TreeParams {
            max_depth: 2,
            min_samples_leaf: 1,
            max_features: None,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, y.view(), &indices, &params, &mut rng);
        assert!(tree.depth() <= 2);
        assert!(tree.node_count() <= 7);

        let params = TreeParams {
            max_depth: 10,
            min_samples_leaf: 40,
            max_features: None,
        };
        let tree = RegressionTree::fit(&x, y.view(), &indices, &params, &mut rng);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_partition() {
        let mut v = vec![5, 1, 8, 2, 9];
        let mid = partition(&mut v, |i| i < 5);
        assert_eq!(mid, 2);
        assert!(v[..mid].iter().all(|&i| i < 5));
        assert!(v[mid..].iter().all(|&i| i >= 5));
    }
}
