//! Evaluation engine.
//!
//! Drives one evaluation run: splits the dataset under a resampling
//! strategy, trains a fresh classifier of every family on each fold,
//! scores the held-out rows, and aggregates per-fold metrics. The last
//! fitted instance of each family is persisted to the model store.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::cross_validation::{FoldSplit, Splitter, ValidationStrategy};
use super::knn::KNNClassifier;
use super::metrics::{self, AggregatedMetrics, FoldMetrics};
use super::naive_bayes::GaussianNaiveBayes;
use super::neural_network::NeuralNetClassifier;
use super::svm::{SVMClassifier, SVMConfig};
use crate::error::{DiabevalError, Result};
use crate::store::ModelStore;

/// Seed for the holdout shuffle, matching the seeded split the evaluation
/// results are reported against.
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Classifier families known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierKind {
    Knn,
    Bayesian,
    Svm,
    NeuralNetwork,
}

impl ClassifierKind {
    /// Parse a request-supplied family name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "knn" => Ok(Self::Knn),
            "bayesian" => Ok(Self::Bayesian),
            "svm" => Ok(Self::Svm),
            "neural network" => Ok(Self::NeuralNetwork),
            _ => Err(DiabevalError::UnknownClassifier(name.to_string())),
        }
    }

    /// Every family, in training order.
    pub fn all() -> [ClassifierKind; 4] {
        [Self::Knn, Self::Bayesian, Self::Svm, Self::NeuralNetwork]
    }

    /// Display name, also the model store key and the results key.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Knn => "kNN",
            Self::Bayesian => "Bayesian",
            Self::Svm => "SVM",
            Self::NeuralNetwork => "Neural Network",
        }
    }

    /// Construct an unfitted classifier of this family.
    pub fn build(&self) -> TrainedClassifier {
        match self {
            Self::Knn => TrainedClassifier::Knn(KNNClassifier::new()),
            Self::Bayesian => TrainedClassifier::Bayesian(GaussianNaiveBayes::new()),
            Self::Svm => TrainedClassifier::Svm(SVMClassifier::new(SVMConfig::default())),
            Self::NeuralNetwork => TrainedClassifier::NeuralNetwork(NeuralNetClassifier::default()),
        }
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// A classifier of any family, fitted or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedClassifier {
    Knn(KNNClassifier),
    Bayesian(GaussianNaiveBayes),
    Svm(SVMClassifier),
    NeuralNetwork(NeuralNetClassifier),
}

impl TrainedClassifier {
    pub fn kind(&self) -> ClassifierKind {
        match self {
            Self::Knn(_) => ClassifierKind::Knn,
            Self::Bayesian(_) => ClassifierKind::Bayesian,
            Self::Svm(_) => ClassifierKind::Svm,
            Self::NeuralNetwork(_) => ClassifierKind::NeuralNetwork,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Self::Knn(m) => m.fit(x, y),
            Self::Bayesian(m) => m.fit(x, y),
            Self::Svm(m) => m.fit(x, y),
            Self::NeuralNetwork(m) => m.fit(x, y),
        }
    }

    /// Class labels in {0, 1}.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Self::Knn(m) => m.predict(x),
            Self::Bayesian(m) => m.predict(x),
            Self::Svm(m) => m.predict(x),
            Self::NeuralNetwork(m) => m.predict(x),
        }
    }

    /// Class-1 scores, or None for families without a probability output.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array1<f64>>> {
        match self {
            Self::Knn(m) => m.predict_proba(x).map(Some),
            Self::Bayesian(m) => m.predict_proba(x).map(Some),
            Self::Svm(_) => Ok(None),
            Self::NeuralNetwork(m) => m.predict_proba(x).map(Some),
        }
    }
}

/// Per-family aggregated metrics keyed by canonical name.
pub type EvaluationResults = BTreeMap<String, AggregatedMetrics>;

/// Orchestrates evaluation runs over the four classifier families.
#[derive(Debug, Clone)]
pub struct EvalEngine {
    random_state: Option<u64>,
    max_loo_samples: Option<usize>,
}

impl EvalEngine {
    pub fn new() -> Self {
        Self {
            random_state: Some(DEFAULT_RANDOM_STATE),
            max_loo_samples: None,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_max_loo_samples(mut self, limit: usize) -> Self {
        self.max_loo_samples = Some(limit);
        self
    }

    /// Run a full evaluation: all four families under `strategy`.
    ///
    /// Fails as a whole if any fold of any family fails; families that
    /// completed before the failure keep their stored models, but no
    /// partial results are returned.
    pub fn evaluate(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        strategy: ValidationStrategy,
        store: &ModelStore,
    ) -> Result<EvaluationResults> {
        metrics::validate_binary_labels(y)?;
        let splits = self.splitter(strategy).split(x.nrows())?;

        let mut results = EvaluationResults::new();
        for kind in ClassifierKind::all() {
            let (aggregated, classifier) = self.evaluate_family(kind, x, y, &splits, strategy)?;
            store.save(kind.canonical_name(), &classifier)?;
            results.insert(kind.canonical_name().to_string(), aggregated);
        }
        Ok(results)
    }

    /// Train one family under the seeded holdout split and persist it.
    ///
    /// Used by the prediction path when no stored model exists yet.
    pub fn train_for_prediction(
        &self,
        kind: ClassifierKind,
        x: &Array2<f64>,
        y: &Array1<f64>,
        store: &ModelStore,
    ) -> Result<TrainedClassifier> {
        metrics::validate_binary_labels(y)?;
        let strategy = ValidationStrategy::Holdout;
        let splits = self.splitter(strategy).split(x.nrows())?;
        let (_, classifier) = self.evaluate_family(kind, x, y, &splits, strategy)?;
        store.save(kind.canonical_name(), &classifier)?;
        Ok(classifier)
    }

    fn splitter(&self, strategy: ValidationStrategy) -> Splitter {
        let mut splitter = Splitter::new(strategy);
        if let Some(seed) = self.random_state {
            splitter = splitter.with_random_state(seed);
        }
        if let Some(limit) = self.max_loo_samples {
            splitter = splitter.with_max_loo_samples(limit);
        }
        splitter
    }

    /// Evaluate one family across all folds.
    ///
    /// Leave-one-out folds are independent, so they run on the rayon pool;
    /// the fold count makes the per-fold overhead worth it there. Returns
    /// the aggregated metrics and the classifier fitted on the final fold.
    fn evaluate_family(
        &self,
        kind: ClassifierKind,
        x: &Array2<f64>,
        y: &Array1<f64>,
        splits: &[FoldSplit],
        strategy: ValidationStrategy,
    ) -> Result<(AggregatedMetrics, TrainedClassifier)> {
        let outcomes: Result<Vec<(FoldMetrics, TrainedClassifier)>> =
            if strategy == ValidationStrategy::LeaveOneOut {
                splits
                    .par_iter()
                    .map(|split| evaluate_fold(kind, x, y, split))
                    .collect()
            } else {
                splits
                    .iter()
                    .map(|split| evaluate_fold(kind, x, y, split))
                    .collect()
            };

        let outcomes = outcomes.map_err(|e| evaluation_failed(kind, e))?;

        let fold_metrics: Vec<FoldMetrics> = outcomes.iter().map(|(m, _)| m.clone()).collect();
        let aggregated = metrics::aggregate(&fold_metrics);

        // Collect preserves fold order, so last() is the final fold.
        let last = outcomes
            .into_iter()
            .last()
            .map(|(_, classifier)| classifier)
            .ok_or_else(|| evaluation_failed_msg(kind, "no folds produced"))?;

        Ok((aggregated, last))
    }
}

impl Default for EvalEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Train a fresh instance on the fold's training rows and score the
/// held-out rows.
fn evaluate_fold(
    kind: ClassifierKind,
    x: &Array2<f64>,
    y: &Array1<f64>,
    split: &FoldSplit,
) -> Result<(FoldMetrics, TrainedClassifier)> {
    let x_train = x.select(Axis(0), &split.train_indices);
    let y_train = y.select(Axis(0), &split.train_indices);
    let x_test = x.select(Axis(0), &split.test_indices);
    let y_test = y.select(Axis(0), &split.test_indices);

    let mut classifier = kind.build();
    classifier.fit(&x_train, &y_train)?;

    let predictions = classifier.predict(&x_test)?;
    let scores = classifier.predict_proba(&x_test)?;
    let fold = metrics::compute_fold_metrics(&y_test, &predictions, scores.as_ref())?;

    Ok((fold, classifier))
}

fn evaluation_failed(kind: ClassifierKind, source: DiabevalError) -> DiabevalError {
    match source {
        already @ DiabevalError::EvaluationFailed { .. } => already,
        other => DiabevalError::EvaluationFailed {
            classifier: kind.canonical_name().to_string(),
            reason: other.to_string(),
        },
    }
}

fn evaluation_failed_msg(kind: ClassifierKind, reason: &str) -> DiabevalError {
    DiabevalError::EvaluationFailed {
        classifier: kind.canonical_name().to_string(),
        reason: reason.to_string(),
    }
}
