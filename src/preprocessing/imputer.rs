//! Zero-sentinel imputation

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{DiabevalError, Result};

/// Replaces zero sentinels with the column mean of the non-zero values.
///
/// Clinical measurement columns in the diabetes table record a missing
/// reading as a literal 0. Each column's replacement mean is computed
/// over its non-zero values before any substitution happens, so earlier
/// replacements never feed into later means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelImputer {
    /// Column indices subject to sentinel replacement.
    columns: Vec<usize>,
    /// Replacement mean per tracked column, aligned with `columns`.
    means: Vec<f64>,
    is_fitted: bool,
}

impl SentinelImputer {
    pub fn new(columns: Vec<usize>) -> Self {
        Self {
            columns,
            means: Vec::new(),
            is_fitted: false,
        }
    }

    /// Computes the per-column non-zero means.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        if let Some(&c) = self.columns.iter().find(|&&c| c >= x.ncols()) {
            return Err(DiabevalError::ShapeMismatch {
                expected: format!("column index < {}", x.ncols()),
                actual: c.to_string(),
            });
        }

        self.means = self
            .columns
            .iter()
            .map(|&c| {
                let mut sum = 0.0;
                let mut count = 0usize;
                for &v in x.column(c).iter() {
                    if v != 0.0 {
                        sum += v;
                        count += 1;
                    }
                }
                // An all-zero column has no observed values; zeros stay.
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            })
            .collect();

        self.is_fitted = true;
        Ok(())
    }

    /// Substitutes the fitted mean for every zero in the tracked columns.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(DiabevalError::NotFitted);
        }

        let mut out = x.clone();
        for (&c, &mean) in self.columns.iter().zip(self.means.iter()) {
            for v in out.column_mut(c).iter_mut() {
                if *v == 0.0 {
                    *v = mean;
                }
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Fitted replacement means, aligned with the tracked columns.
    pub fn means(&self) -> &[f64] {
        &self.means
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_computed_before_replacement() {
        let x = array![[0.0, 1.0], [2.0, 1.0], [4.0, 1.0]];
        let mut imputer = SentinelImputer::new(vec![0]);
        let out = imputer.fit_transform(&x).unwrap();

        // Mean of the non-zero values {2, 4} is 3, not a mean that
        // includes the replaced cell.
        assert_eq!(imputer.means(), &[3.0]);
        assert_eq!(out[[0, 0]], 3.0);
        assert_eq!(out[[1, 0]], 2.0);
        assert_eq!(out[[2, 0]], 4.0);
    }

    #[test]
    fn test_untracked_columns_keep_zeros() {
        let x = array![[0.0, 0.0], [2.0, 5.0]];
        let mut imputer = SentinelImputer::new(vec![0]);
        let out = imputer.fit_transform(&x).unwrap();

        assert_eq!(out[[0, 0]], 2.0);
        assert_eq!(out[[0, 1]], 0.0);
    }

    #[test]
    fn test_all_zero_column_unchanged() {
        let x = array![[0.0], [0.0], [0.0]];
        let mut imputer = SentinelImputer::new(vec![0]);
        let out = imputer.fit_transform(&x).unwrap();

        assert_eq!(imputer.means(), &[0.0]);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_transform_before_fit_rejected() {
        let x = array![[1.0]];
        let imputer = SentinelImputer::new(vec![0]);
        assert!(matches!(
            imputer.transform(&x),
            Err(DiabevalError::NotFitted)
        ));
    }

    #[test]
    fn test_out_of_range_column_rejected() {
        let x = array![[1.0]];
        let mut imputer = SentinelImputer::new(vec![3]);
        assert!(imputer.fit(&x).is_err());
    }
}
