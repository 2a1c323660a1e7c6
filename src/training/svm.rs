//! Soft-margin SVM trained with SMO.
//!
//! Binary classifier with an RBF kernel. Exposes a decision function but
//! no calibrated probability, so its folds carry no ROC-AUC.

use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{DiabevalError, Result};

/// Maximum number of samples for the eager kernel matrix. Beyond this,
/// training errors out rather than risking OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter.
    pub c: f64,
    /// RBF kernel width; None resolves to 1 / n_features at fit time.
    pub gamma: Option<f64>,
    /// Tolerance for the KKT stopping criterion.
    pub tol: f64,
    pub max_iter: usize,
    pub random_state: Option<u64>,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
        }
    }
}

/// Support vector classifier over {0, 1} labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    support_vectors: Option<Array2<f64>>,
    /// Lagrange multipliers for the support vectors.
    alphas: Option<Array1<f64>>,
    /// Signed labels (+1 / -1) for the support vectors.
    support_labels: Option<Array1<f64>>,
    bias: f64,
    /// Kernel width resolved at fit time.
    gamma: f64,
    is_fitted: bool,
}

impl SVMClassifier {
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            alphas: None,
            support_labels: None,
            bias: 0.0,
            gamma: 0.0,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(DiabevalError::ShapeMismatch {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{}", y.len()),
            });
        }

        let has_pos = y.iter().any(|&v| v > 0.5);
        let has_neg = y.iter().any(|&v| v <= 0.5);
        if !has_pos || !has_neg {
            return Err(DiabevalError::DataError(
                "SVM needs both classes in the training set".to_string(),
            ));
        }

        self.gamma = self
            .config
            .gamma
            .unwrap_or(1.0 / x.ncols().max(1) as f64);

        // Class 1 maps to +1, class 0 to -1.
        let y_signed: Array1<f64> = y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 });

        let (alphas, bias, support_indices) = self.smo_train(x, &y_signed)?;

        let sv_count = support_indices.len();
        let n_features = x.ncols();

        let mut support_vectors = Array2::zeros((sv_count, n_features));
        let mut support_labels = Array1::zeros(sv_count);
        let mut support_alphas = Array1::zeros(sv_count);

        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y_signed[idx];
            support_alphas[i] = alphas[idx];
        }

        self.support_vectors = Some(support_vectors);
        self.support_labels = Some(support_labels);
        self.alphas = Some(support_alphas);
        self.bias = bias;
        self.is_fitted = true;
        Ok(())
    }

    /// Simplified SMO: scan for KKT violations, pair with a random second
    /// index, and update the two multipliers analytically.
    fn smo_train(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array1<f64>, f64, Vec<usize>)> {
        let n = x.nrows();

        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(DiabevalError::DataError(format!(
                "{} samples exceed the {} limit for the SVM kernel matrix",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let mut alphas = Array1::zeros(n);
        let mut bias = 0.0;

        let kernel_matrix = self.compute_kernel_matrix(x);

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            if n <= 1 {
                break;
            }

            for i in 0..n {
                let e_i = decision_cached(&kernel_matrix, &alphas, y, bias, i) - y[i];

                // KKT violation check.
                if (y[i] * e_i < -self.config.tol && alphas[i] < self.config.c)
                    || (y[i] * e_i > self.config.tol && alphas[i] > 0.0)
                {
                    // n > 1 guaranteed above.
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision_cached(&kernel_matrix, &alphas, y, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        (
                            (alphas[j] - alphas[i]).max(0.0),
                            (self.config.c + alphas[j] - alphas[i]).min(self.config.c),
                        )
                    } else {
                        (
                            (alphas[i] + alphas[j] - self.config.c).max(0.0),
                            (alphas[i] + alphas[j]).min(self.config.c),
                        )
                    };

                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * kernel_matrix[[i, j]]
                        - kernel_matrix[[i, i]]
                        - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).max(l).min(h);

                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < self.config.c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < self.config.c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        Ok((alphas, bias, support_indices))
    }

    /// Symmetric kernel matrix; row-parallel beyond 100 samples.
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let gamma = self.gamma;

        if n < 100 {
            let mut k = Array2::zeros((n, n));
            for i in 0..n {
                for j in i..n {
                    let val = rbf(x.row(i), x.row(j), gamma);
                    k[[i, j]] = val;
                    k[[j, i]] = val;
                }
            }
            return k;
        }

        let rows: Vec<Vec<(usize, f64)>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i..n)
                    .map(|j| (j, rbf(x.row(i), x.row(j), gamma)))
                    .collect()
            })
            .collect();

        let mut k = Array2::zeros((n, n));
        for (i, row_vals) in rows.into_iter().enumerate() {
            for (j, val) in row_vals {
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    fn score_sample(&self, sample: ArrayView1<f64>) -> f64 {
        let sv = self.support_vectors.as_ref();
        let alphas = self.alphas.as_ref();
        let labels = self.support_labels.as_ref();
        let (sv, alphas, labels) = match (sv, alphas, labels) {
            (Some(sv), Some(a), Some(l)) => (sv, a, l),
            _ => return 0.0,
        };

        let mut sum = self.bias;
        for j in 0..sv.nrows() {
            sum += alphas[j] * labels[j] * rbf(sample, sv.row(j), self.gamma);
        }
        sum
    }

    /// Predict class labels: score >= 0 is class 1.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_function(x)?;
        Ok(scores.mapv(|s| if s >= 0.0 { 1.0 } else { 0.0 }))
    }

    /// Raw margin scores.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(DiabevalError::NotFitted);
        }

        Ok((0..x.nrows())
            .map(|i| self.score_sample(x.row(i)))
            .collect())
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors
            .as_ref()
            .map(|sv| sv.nrows())
            .unwrap_or(0)
    }
}

fn rbf(a: ArrayView1<f64>, b: ArrayView1<f64>, gamma: f64) -> f64 {
    let norm_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum();
    (-gamma * norm_sq).exp()
}

fn decision_cached(
    k: &Array2<f64>,
    alphas: &Array1<f64>,
    y: &Array1<f64>,
    bias: f64,
    idx: usize,
) -> f64 {
    let mut sum = 0.0;
    for i in 0..alphas.len() {
        sum += alphas[i] * y[i] * k[[i, idx]];
    }
    sum + bias
}
