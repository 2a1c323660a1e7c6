//! Gaussian naive Bayes classifier.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::error::{DiabevalError, Result};

/// Gaussian naive Bayes over binary labels.
///
/// Per-class feature means and variances estimated in a single Welford
/// pass, with variance smoothing against degenerate features. Scoring
/// happens in log space with log-sum-exp normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Mean of each feature for each class.
    means: HashMap<i64, Vec<f64>>,
    /// Variance of each feature for each class.
    variances: HashMap<i64, Vec<f64>>,
    /// Prior probability of each class.
    priors: HashMap<i64, f64>,
    /// Classes seen during fit, sorted.
    classes: Vec<i64>,
    var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: HashMap::new(),
            variances: HashMap::new(),
            priors: HashMap::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
        }
    }

    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(DiabevalError::ShapeMismatch {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(DiabevalError::DataError(
                "cannot fit on an empty training set".to_string(),
            ));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let mut class_counts: HashMap<i64, usize> = HashMap::new();
        for &label in y.iter() {
            *class_counts.entry(label as i64).or_insert(0) += 1;
        }

        self.classes = class_counts.keys().cloned().collect();
        self.classes.sort_unstable();

        self.priors.clear();
        for (&class, &count) in &class_counts {
            self.priors.insert(class, count as f64 / n_samples as f64);
        }

        self.means.clear();
        self.variances.clear();
        for &class in &self.classes {
            let class_indices: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &yi)| yi as i64 == class)
                .map(|(i, _)| i)
                .collect();
            let n_class = class_indices.len();

            // Single-pass Welford for per-feature mean and variance.
            let mut feature_means = vec![0.0; n_features];
            let mut feature_m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for &idx in &class_indices {
                count += 1;
                for (j, &val) in x.row(idx).iter().enumerate() {
                    let delta = val - feature_means[j];
                    feature_means[j] += delta / count as f64;
                    let delta2 = val - feature_means[j];
                    feature_m2[j] += delta * delta2;
                }
            }
            let feature_vars: Vec<f64> = feature_m2
                .iter()
                .map(|&m2| (m2 / n_class as f64) + self.var_smoothing)
                .collect();

            self.means.insert(class, feature_means);
            self.variances.insert(class, feature_vars);
        }

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.predict_log_proba(x)?;

        Ok(log_probs
            .rows()
            .into_iter()
            .map(|row| {
                let max_idx = row
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| {
                        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.classes[max_idx] as f64
            })
            .collect())
    }

    /// Posterior probability of class 1.
    ///
    /// A fit that saw only one class reports 0 or 1 accordingly.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.predict_log_proba(x)?;

        let pos_idx = self.classes.iter().position(|&c| c == 1);
        Ok(log_probs
            .rows()
            .into_iter()
            .map(|row| match pos_idx {
                Some(j) => row[j].exp(),
                None => 0.0,
            })
            .collect())
    }

    /// Normalized log posteriors, one column per fitted class.
    fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(DiabevalError::NotFitted);
        }

        let n_samples = x.nrows();
        let n_classes = self.classes.len();
        let mut log_probs = Array2::zeros((n_samples, n_classes));

        for (i, row) in x.rows().into_iter().enumerate() {
            for (j, &class) in self.classes.iter().enumerate() {
                let log_prior = self.priors[&class].ln();
                log_probs[[i, j]] = log_prior + self.log_likelihood(row, class);
            }
        }

        // Log-sum-exp normalization per row.
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum: f64 = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            for val in row.iter_mut() {
                *val = *val - max_val - log_sum;
            }
        }

        Ok(log_probs)
    }

    fn log_likelihood(&self, x: ArrayView1<f64>, class: i64) -> f64 {
        let means = &self.means[&class];
        let vars = &self.variances[&class];

        x.iter()
            .zip(means.iter())
            .zip(vars.iter())
            .map(|((&xi, &mean), &var)| {
                -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
            })
            .sum()
    }

    pub fn class_priors(&self) -> &HashMap<i64, f64> {
        &self.priors
    }
}
