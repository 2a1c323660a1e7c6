//! Diabeval - Classifier evaluation engine for the diabetes dataset
//!
//! This crate evaluates four classifier families over the Pima diabetes
//! table under interchangeable validation strategies, and serves single-row
//! predictions from persisted models. It includes:
//! - Dataset loading with zero-sentinel imputation and standard scaling
//! - kNN, Gaussian naive Bayes, SVM, and neural network classifiers
//! - Holdout, k-fold, and leave-one-out validation with aggregated metrics
//! - Web server and CLI interfaces
//!
//! # Modules
//!
//! ## Core
//! - [`data`] - Dataset loading and column conventions
//! - [`preprocessing`] - Sentinel imputation and standardization
//! - [`training`] - Classifiers, validation splits, metrics, evaluation
//! - [`store`] - Trained model persistence
//!
//! ## Services
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core pipeline
pub mod data;
pub mod preprocessing;
pub mod store;
pub mod training;

// Services
pub mod cli;
pub mod server;

pub use error::{DiabevalError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{DiabevalError, Result};

    // Data access
    pub use crate::data::{load_csv, split_features_labels};

    // Preprocessing
    pub use crate::preprocessing::{PreparedDataset, Preprocessor, SentinelImputer, StandardScaler};

    // Training and evaluation
    pub use crate::training::{
        AggregatedMetrics, ClassifierKind, EvalEngine, EvaluationResults, FoldMetrics, Splitter,
        TrainedClassifier, ValidationStrategy,
    };

    // Persistence
    pub use crate::store::ModelStore;
}
