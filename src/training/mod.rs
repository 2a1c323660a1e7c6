//! Classifier training and evaluation.
//!
//! Four classifier families behind one dispatch enum:
//! - K-Nearest Neighbors (majority vote, k = 5)
//! - Gaussian Naive Bayes
//! - Support Vector Machine (SMO, RBF kernel)
//! - Neural network (16/8/1 feedforward, Adam)
//!
//! plus the resampling strategies, binary classification metrics, and the
//! evaluation engine that ties them together.

mod engine;
pub mod cross_validation;
pub mod knn;
pub mod metrics;
pub mod naive_bayes;
pub mod neural_network;
pub mod svm;

pub use cross_validation::{
    FoldSplit, Splitter, ValidationStrategy, DEFAULT_LOO_CEILING, HOLDOUT_TEST_FRACTION,
};
pub use engine::{
    ClassifierKind, EvalEngine, EvaluationResults, TrainedClassifier, DEFAULT_RANDOM_STATE,
};
pub use knn::KNNClassifier;
pub use metrics::{AggregatedMetrics, FoldMetrics};
pub use naive_bayes::GaussianNaiveBayes;
pub use neural_network::{NeuralNetClassifier, NeuralNetConfig};
pub use svm::{SVMClassifier, SVMConfig};
