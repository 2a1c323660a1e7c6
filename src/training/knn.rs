//! K-nearest-neighbours classifier.

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{DiabevalError, Result};

/// Default neighbour count.
pub const DEFAULT_NEIGHBORS: usize = 5;

/// Binary kNN with Euclidean distance and uniform majority vote.
///
/// Fit stores the training rows; prediction scans them per test row with
/// a bounded max-heap, parallelized across test rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    n_neighbors: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KNNClassifier {
    pub fn new() -> Self {
        Self::with_k(DEFAULT_NEIGHBORS)
    }

    pub fn with_k(k: usize) -> Self {
        Self {
            n_neighbors: k.max(1),
            x_train: None,
            y_train: None,
        }
    }

    /// Fit stores the training data.
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

        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    /// Predict class labels, parallelized over test rows.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Probability of class 1 as the positive-vote fraction among the k
    /// nearest neighbours.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(DiabevalError::NotFitted)?;
        let y_train = self.y_train.as_ref().ok_or(DiabevalError::NotFitted)?;
        let k = self.n_neighbors;

        let probs: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k);
                let positives = neighbors.iter().filter(|(_, label)| *label > 0.5).count();
                positives as f64 / neighbors.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(probs))
    }
}

impl Default for KNNClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Max-heap entry for the partial sort (keeps the k smallest distances).
#[derive(PartialEq)]
struct DistLabel(f64, f64);

impl Eq for DistLabel {}
impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}
impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Find the k nearest training rows with a max-heap, O(n log k).
///
/// When the training set has fewer than k rows, all of them are returned.
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
) -> Vec<(f64, f64)> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (i, row) in x_train.rows().into_iter().enumerate() {
        let dist = euclidean(point, row);
        if heap.len() < k {
            heap.push(DistLabel(dist, y_train[i]));
        } else if let Some(top) = heap.peek() {
            if dist < top.0 {
                heap.pop();
                heap.push(DistLabel(dist, y_train[i]));
            }
        }
    }

    heap.into_iter().map(|dl| (dl.0, dl.1)).collect()
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec(
            (10, 2),
            vec![
                1.0, 1.0, 1.5, 1.5, 2.0, 2.0, 1.0, 2.0, 1.8, 1.2, //
                8.0, 8.0, 8.5, 8.5, 9.0, 9.0, 8.0, 9.0, 8.8, 8.2,
            ],
        )
        .unwrap();
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separable_clusters_classified_perfectly() {
        let (x, y) = separable_data();
        let mut knn = KNNClassifier::new();
        knn.fit(&x, &y).unwrap();

        let predictions = knn.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
    }

    #[test]
    fn test_proba_is_vote_fraction() {
        let (x, y) = separable_data();
        let mut knn = KNNClassifier::new();
        knn.fit(&x, &y).unwrap();

        let probs = knn
            .predict_proba(&Array2::from_shape_vec((2, 2), vec![1.2, 1.2, 8.7, 8.7]).unwrap())
            .unwrap();
        assert_eq!(probs[0], 0.0);
        assert_eq!(probs[1], 1.0);
    }

    #[test]
    fn test_small_training_set_uses_all_rows() {
        let x = array![[0.0, 0.0], [10.0, 10.0]];
        let y = array![0.0, 1.0];
        let mut knn = KNNClassifier::new();
        knn.fit(&x, &y).unwrap();

        // Only two neighbours exist; the vote is split, so the tie goes
        // negative.
        let probs = knn.predict_proba(&array![[5.0, 5.0]]).unwrap();
        assert_eq!(probs[0], 0.5);
        let pred = knn.predict(&array![[5.0, 5.0]]).unwrap();
        assert_eq!(pred[0], 0.0);
    }

    #[test]
    fn test_predict_before_fit_rejected() {
        let knn = KNNClassifier::new();
        assert!(matches!(
            knn.predict(&array![[0.0]]),
            Err(DiabevalError::NotFitted)
        ));
    }

    #[test]
    fn test_fit_rejects_mismatched_labels() {
        let mut knn = KNNClassifier::new();
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![0.0];
        assert!(matches!(
            knn.fit(&x, &y),
            Err(DiabevalError::ShapeMismatch { .. })
        ));
    }
}
