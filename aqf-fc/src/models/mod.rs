//! Regression models fitted per pollutant

pub mod boosting;
pub mod forest;
pub mod linear;
pub mod tree;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use linear::LinearRegression;
pub use tree::{RegressionTree, TreeParams};

/// Anything that maps a feature row to a value
pub trait Regressor {
    fn predict_row(&self, x: ArrayView1<f64>) -> f64;

    fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    RandomForest,
    GradientBoosting,
    LinearRegression,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
        ModelKind::LinearRegression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "RandomForest",
            ModelKind::GradientBoosting => "GradientBoosting",
            ModelKind::LinearRegression => "LinearRegression",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fitted model of any kind, as stored in the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model")]
pub enum TrainedModel {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    LinearRegression(LinearRegression),
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
            TrainedModel::LinearRegression(_) => ModelKind::LinearRegression,
        }
    }
}

impl Regressor for TrainedModel {
    fn predict_row(&self, x: ArrayView1<f64>) -> f64 {
        match self {
            TrainedModel::RandomForest(m) => m.predict_row(x),
            TrainedModel::GradientBoosting(m) => m.predict_row(x),
            TrainedModel::LinearRegression(m) => m.predict_row(x),
        }
    }
}
