//! Ordinary least squares via the normal equations

use ndarray::{s, Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::Regressor;
use crate::error::{ForecastError, ForecastResult};

/// Added to the diagonal (except the intercept) to keep XᵀX invertible
const RIDGE: f64 = 1e-8;

const PIVOT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(x: &Array2<f64>, y: ArrayView1<f64>) -> ForecastResult<Self> {
        let (n, p) = x.dim();
        if n == 0 {
            return Err(ForecastError::InsufficientData(0));
        }

        // Design matrix with a leading column of ones
        let mut design = Array2::<f64>::ones((n, p + 1));
        design.slice_mut(s![.., 1..]).assign(x);

        let mut xtx = design.t().dot(&design);
        for j in 1..=p {
            xtx[[j, j]] += RIDGE;
        }
        let xty = design.t().dot(&y);

        let beta = solve(xtx, xty)?;
        Ok(Self {
            intercept: beta[0],
            coefficients: beta.iter().skip(1).copied().collect(),
        })
    }
}

impl Regressor for LinearRegression {
    fn predict_row(&self, x: ArrayView1<f64>) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x.iter())
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> ForecastResult<Array1<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot_row, col]].abs() < PIVOT_EPSILON {
            return Err(ForecastError::SingularMatrix);
        }

        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::SingularMatrix);
    }
    Ok(x)
}
