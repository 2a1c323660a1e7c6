//! Feedforward neural network for binary classification.
//!
//! Fixed topology: input -> 16 -> 8 -> 1, ReLU on the hidden layers and a
//! sigmoid output. Trained full-batch with Adam on binary cross-entropy.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{DiabevalError, Result};

const HIDDEN_1: usize = 16;
const HIDDEN_2: usize = 8;

const ADAM_BETA_1: f64 = 0.9;
const ADAM_BETA_2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// Neural network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetConfig {
    /// Adam step size.
    pub learning_rate: f64,
    /// Fixed epoch budget; one full-batch update per epoch.
    pub max_epochs: usize,
    pub random_state: Option<u64>,
}

impl Default for NeuralNetConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            max_epochs: 300,
            random_state: Some(42),
        }
    }
}

/// Binary classifier with a sigmoid output head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetClassifier {
    config: NeuralNetConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    is_fitted: bool,
}

impl NeuralNetClassifier {
    pub fn new(config: NeuralNetConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
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
        if x.nrows() == 0 {
            return Err(DiabevalError::DataError(
                "Cannot train on an empty dataset".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.initialize_weights();

        let n = x.nrows() as f64;
        let y_2d = y.clone().insert_axis(Axis(1));

        // Adam state, one slot per layer.
        let mut m_w: Vec<Array2<f64>> = self
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let mut v_w: Vec<Array2<f64>> = self
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let mut m_b: Vec<Array1<f64>> = self
            .biases
            .iter()
            .map(|b| Array1::zeros(b.len()))
            .collect();
        let mut v_b: Vec<Array1<f64>> = self
            .biases
            .iter()
            .map(|b| Array1::zeros(b.len()))
            .collect();

        for epoch in 0..self.config.max_epochs {
            let (activations, z_values) = self.forward(x);

            // Sigmoid + binary cross-entropy collapse to (output - y) / n.
            let output = &activations[self.weights.len()];
            let mut delta = (output - &y_2d) / n;

            let mut gradients = Vec::new();
            for i in (0..self.weights.len()).rev() {
                let a_prev = &activations[i];
                let grad_w = a_prev.t().dot(&delta);
                let grad_b = delta.sum_axis(Axis(0));
                gradients.push((grad_w, grad_b));

                if i > 0 {
                    let z = &z_values[i - 1];
                    delta = delta.dot(&self.weights[i].t()) * relu_derivative(z);
                }
            }
            gradients.reverse();

            let t = (epoch + 1) as i32;
            let correction_1 = 1.0 - ADAM_BETA_1.powi(t);
            let correction_2 = 1.0 - ADAM_BETA_2.powi(t);
            let lr = self.config.learning_rate;

            for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                m_w[i] = &m_w[i] * ADAM_BETA_1 + &grad_w * (1.0 - ADAM_BETA_1);
                v_w[i] = &v_w[i] * ADAM_BETA_2 + &grad_w.mapv(|g| g * g) * (1.0 - ADAM_BETA_2);
                m_b[i] = &m_b[i] * ADAM_BETA_1 + &grad_b * (1.0 - ADAM_BETA_1);
                v_b[i] = &v_b[i] * ADAM_BETA_2 + &grad_b.mapv(|g| g * g) * (1.0 - ADAM_BETA_2);

                let m_hat_w = &m_w[i] / correction_1;
                let v_hat_w = &v_w[i] / correction_2;
                let m_hat_b = &m_b[i] / correction_1;
                let v_hat_b = &v_b[i] / correction_2;

                self.weights[i] =
                    &self.weights[i] - &(m_hat_w / (v_hat_w.mapv(f64::sqrt) + ADAM_EPSILON) * lr);
                self.biases[i] =
                    &self.biases[i] - &(m_hat_b / (v_hat_b.mapv(f64::sqrt) + ADAM_EPSILON) * lr);
            }
        }

        self.is_fitted = true;
        Ok(())
    }

    /// Predict class labels by thresholding the sigmoid output at 0.5.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Raw sigmoid output, interpreted as P(class 1).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_fitted(x)?;
        Ok(self.forward_output(x).column(0).to_owned())
    }

    fn check_fitted(&self, x: &Array2<f64>) -> Result<()> {
        if !self.is_fitted {
            return Err(DiabevalError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(DiabevalError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{}", x.ncols()),
            });
        }
        Ok(())
    }

    fn initialize_weights(&mut self) {
        self.weights.clear();
        self.biases.clear();

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let layer_sizes = [self.n_features, HIDDEN_1, HIDDEN_2, 1];

        for i in 0..layer_sizes.len() - 1 {
            let n_in = layer_sizes[i];
            let n_out = layer_sizes[i + 1];

            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();

            let weights: Vec<f64> = (0..n_in * n_out)
                .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
                .collect();

            let layer = Array2::from_shape_vec((n_in, n_out), weights)
                .unwrap_or_else(|_| Array2::zeros((n_in, n_out)));
            self.weights.push(layer);
            self.biases.push(Array1::zeros(n_out));
        }
    }

    /// Forward pass keeping every layer's pre- and post-activation values.
    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::new();

        let last = self.weights.len() - 1;
        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations[i].dot(w) + b;
            let a = if i < last { relu(&z) } else { sigmoid(&z) };
            z_values.push(z);
            activations.push(a);
        }

        (activations, z_values)
    }

    /// Inference-mode forward pass, output layer only.
    fn forward_output(&self, x: &Array2<f64>) -> Array2<f64> {
        let last = self.weights.len() - 1;
        let mut a = x.clone();
        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = a.dot(w) + b;
            a = if i < last { relu(&z) } else { sigmoid(&z) };
        }
        a
    }
}

impl Default for NeuralNetClassifier {
    fn default() -> Self {
        Self::new(NeuralNetConfig::default())
    }
}

fn relu(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| v.max(0.0))
}

fn relu_derivative(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

fn sigmoid(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}
