//! Feature standardization

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DiabevalError, Result};

/// Z-score standardization: (x - mean) / std per feature.
///
/// Fit once over the full table and reused unmodified for every later
/// single-row prediction. Re-fitting per request would shift the
/// decision boundary of every persisted classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Array1<f64>,
    stds: Array1<f64>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            means: Array1::zeros(0),
            stds: Array1::zeros(0),
            is_fitted: false,
        }
    }

    /// Learns per-feature mean and population standard deviation.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(DiabevalError::DataError(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let n = x.nrows() as f64;
        self.means = x.sum_axis(Axis(0)) / n;

        let mut stds = Array1::zeros(x.ncols());
        for (j, col) in x.axis_iter(Axis(1)).enumerate() {
            let mean = self.means[j];
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            // Constant columns map to 0 rather than NaN.
            stds[j] = if std == 0.0 { 1.0 } else { std };
        }
        self.stds = stds;

        self.is_fitted = true;
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_fitted(x.ncols())?;
        Ok(Array2::from_shape_fn(x.dim(), |(i, j)| {
            (x[[i, j]] - self.means[j]) / self.stds[j]
        }))
    }

    /// Standardizes one feature row; the prediction-path entry point.
    pub fn transform_row(&self, row: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_fitted(row.len())?;
        Ok(Array1::from_shape_fn(row.len(), |j| {
            (row[j] - self.means[j]) / self.stds[j]
        }))
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    fn check_fitted(&self, width: usize) -> Result<()> {
        if !self.is_fitted {
            return Err(DiabevalError::NotFitted);
        }
        if width != self.means.len() {
            return Err(DiabevalError::ShapeMismatch {
                expected: format!("{} features", self.means.len()),
                actual: format!("{} features", width),
            });
        }
        Ok(())
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
