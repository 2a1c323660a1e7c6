//! Data preprocessing for the evaluation pipeline.
//!
//! Pipeline order matches the serving path: zero-sentinel imputation on
//! the measurement columns, feature/label split, then standardization.
//! The fitted scaler travels with the prepared dataset and is reused
//! unmodified for every later single-row prediction.

mod imputer;
mod scaler;

pub use imputer::SentinelImputer;
pub use scaler::StandardScaler;

use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;

use crate::data;
use crate::error::Result;

/// A preprocessed dataset ready for evaluation and prediction.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// Standardized feature matrix, N rows by D features.
    pub x: Array2<f64>,
    /// Binary labels, row-aligned with `x`.
    pub y: Array1<f64>,
    /// The scaling transform fit on `x`'s pre-scaling values.
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
}

impl PreparedDataset {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

/// Fits the imputation/scaling pipeline over a raw table.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    sentinel_columns: Vec<String>,
}

impl Preprocessor {
    /// Preprocessor for the diabetes schema.
    pub fn new() -> Self {
        Self {
            sentinel_columns: data::SENTINEL_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Overrides the sentinel column list.
    pub fn with_sentinel_columns(mut self, columns: Vec<String>) -> Self {
        self.sentinel_columns = columns;
        self
    }

    /// Imputes sentinels, splits features from the label, and fits the
    /// scaler. The label is the table's last column.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<PreparedDataset> {
        let (raw_x, y, feature_names) = data::split_features_labels(df)?;

        // Sentinel columns absent from this table are skipped.
        let tracked: Vec<usize> = feature_names
            .iter()
            .enumerate()
            .filter(|(_, name)| self.sentinel_columns.iter().any(|c| c == *name))
            .map(|(idx, _)| idx)
            .collect();

        let mut imputer = SentinelImputer::new(tracked);
        let imputed = imputer.fit_transform(&raw_x)?;

        let mut scaler = StandardScaler::new();
        let x = scaler.fit_transform(&imputed)?;

        Ok(PreparedDataset {
            x,
            y,
            scaler,
            feature_names,
        })
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
