//! Classification metrics and per-fold aggregation.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{DiabevalError, Result};

/// Metric bundle for a single evaluation fold.
///
/// `roc_auc` is None when the classifier exposes no probability score or
/// the fold's test labels contain a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: Option<f64>,
}

/// Per-classifier summary across folds.
///
/// Each field is the mean of the fold values that exist for that field;
/// roc_auc averages only the folds that produced a value and stays None
/// when none did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: Option<f64>,
}

/// Fails fast when any label is not exactly 0 or 1.
pub fn validate_binary_labels(y: &Array1<f64>) -> Result<()> {
    for (row, &value) in y.iter().enumerate() {
        if value != 0.0 && value != 1.0 {
            return Err(DiabevalError::InvalidLabel { row, value });
        }
    }
    Ok(())
}

/// Scores one fold from predictions, optional class-1 scores, and truth.
///
/// Pure: inputs are read-only. Zero denominators produce 0.0, never NaN.
pub fn compute_fold_metrics(
    y_true: &Array1<f64>,
    predictions: &Array1<f64>,
    scores: Option<&Array1<f64>>,
) -> Result<FoldMetrics> {
    if y_true.len() != predictions.len() {
        return Err(DiabevalError::ShapeMismatch {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{}", predictions.len()),
        });
    }
    if y_true.is_empty() {
        return Err(DiabevalError::DataError(
            "cannot score an empty fold".to_string(),
        ));
    }

    let n = y_true.len() as f64;
    let correct = y_true
        .iter()
        .zip(predictions.iter())
        .filter(|(t, p)| (**t - **p).abs() < 0.5)
        .count();
    let accuracy = correct as f64 / n;

    let (tp, fp, _tn, fn_) = confusion_counts(y_true, predictions);

    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    let roc_auc = scores.and_then(|s| roc_auc_score(s, y_true));

    Ok(FoldMetrics {
        accuracy,
        precision,
        recall,
        f1_score,
        roc_auc,
    })
}

fn confusion_counts(y_true: &Array1<f64>, predictions: &Array1<f64>) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(predictions.iter()) {
        match (*t > 0.5, *p > 0.5) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    (tp, fp, tn, fn_)
}

/// Area under the ROC curve by the trapezoidal rule.
///
/// Walks thresholds over the scores sorted descending, grouping ties, and
/// accumulates (FPR, TPR) points from (0, 0) to (1, 1). Returns None when
/// the labels contain no positives or no negatives, since the curve is
/// undefined there.
pub fn roc_auc_score(scores: &Array1<f64>, labels: &Array1<f64>) -> Option<f64> {
    if scores.len() != labels.len() || scores.is_empty() {
        return None;
    }

    let total_pos = labels.iter().filter(|&&l| l > 0.5).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return None;
    }

    // Descending score; ties rank negatives first.
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (labels[a] > 0.5).cmp(&(labels[b] > 0.5)))
    });

    let p = total_pos as f64;
    let n = total_neg as f64;

    let mut fprs = vec![0.0];
    let mut tprs = vec![0.0];
    let mut tp = 0usize;
    let mut fp = 0usize;

    let mut i = 0;
    while i < indices.len() {
        let current_score = scores[indices[i]];
        while i < indices.len() && scores[indices[i]] == current_score {
            if labels[indices[i]] > 0.5 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        fprs.push(fp as f64 / n);
        tprs.push(tp as f64 / p);
    }

    let mut auc = 0.0;
    for i in 1..fprs.len() {
        auc += (fprs[i] - fprs[i - 1]).abs() * (tprs[i] + tprs[i - 1]) / 2.0;
    }
    Some(auc)
}

/// Order-independent per-field mean across folds.
pub fn aggregate(folds: &[FoldMetrics]) -> AggregatedMetrics {
    if folds.is_empty() {
        return AggregatedMetrics {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            roc_auc: None,
        };
    }

    let n = folds.len() as f64;
    let auc_values: Vec<f64> = folds.iter().filter_map(|f| f.roc_auc).collect();
    let roc_auc = if auc_values.is_empty() {
        None
    } else {
        Some(auc_values.iter().sum::<f64>() / auc_values.len() as f64)
    };

    AggregatedMetrics {
        accuracy: folds.iter().map(|f| f.accuracy).sum::<f64>() / n,
        precision: folds.iter().map(|f| f.precision).sum::<f64>() / n,
        recall: folds.iter().map(|f| f.recall).sum::<f64>() / n,
        f1_score: folds.iter().map(|f| f.f1_score).sum::<f64>() / n,
        roc_auc,
    }
}
