//! Resampling strategies for classifier validation.
//!
//! Three interchangeable splitters produce (train, test) index pairs over
//! the dataset rows: a seeded holdout, contiguous k-fold, and
//! leave-one-out. Leave-one-out is gated by a sample ceiling so a large
//! table cannot request N folds of work.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DiabevalError, Result};

/// Fraction of rows assigned to the holdout test set.
pub const HOLDOUT_TEST_FRACTION: f64 = 0.2;

/// Leave-one-out admission ceiling, in rows.
pub const DEFAULT_LOO_CEILING: usize = 1000;

/// A validation strategy selected by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStrategy {
    /// Single seeded 80/20 split.
    Holdout,
    /// Contiguous k-fold with full test coverage.
    KFold { n_splits: usize },
    /// One fold per row.
    LeaveOneOut,
}

impl ValidationStrategy {
    /// Parses a wire name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "holdout" => Ok(Self::Holdout),
            "3-fold" => Ok(Self::KFold { n_splits: 3 }),
            "10-fold" => Ok(Self::KFold { n_splits: 10 }),
            "leave-one-out" => Ok(Self::LeaveOneOut),
            _ => Err(DiabevalError::UnknownStrategy(name.to_string())),
        }
    }

    /// Accepted wire names, for error messages and docs.
    pub fn wire_names() -> [&'static str; 4] {
        ["holdout", "3-fold", "10-fold", "leave-one-out"]
    }
}

impl std::fmt::Display for ValidationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Holdout => write!(f, "holdout"),
            Self::KFold { n_splits } => write!(f, "{}-fold", n_splits),
            Self::LeaveOneOut => write!(f, "leave-one-out"),
        }
    }
}

/// A single train/test split over row indices.
#[derive(Debug, Clone)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Produces the full split sequence for one strategy.
#[derive(Debug, Clone)]
pub struct Splitter {
    strategy: ValidationStrategy,
    random_state: Option<u64>,
    max_loo_samples: usize,
}

impl Splitter {
    pub fn new(strategy: ValidationStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
            max_loo_samples: DEFAULT_LOO_CEILING,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_max_loo_samples(mut self, limit: usize) -> Self {
        self.max_loo_samples = limit;
        self
    }

    pub fn strategy(&self) -> ValidationStrategy {
        self.strategy
    }

    /// Generates every split for `n_samples` rows.
    ///
    /// Leave-one-out is rejected up front when `n_samples` exceeds the
    /// ceiling; no folds are produced in that case.
    pub fn split(&self, n_samples: usize) -> Result<Vec<FoldSplit>> {
        match self.strategy {
            ValidationStrategy::Holdout => self.holdout_split(n_samples),
            ValidationStrategy::KFold { n_splits } => self.k_fold_split(n_samples, n_splits),
            ValidationStrategy::LeaveOneOut => self.leave_one_out_split(n_samples),
        }
    }

    fn holdout_split(&self, n_samples: usize) -> Result<Vec<FoldSplit>> {
        if n_samples < 2 {
            return Err(DiabevalError::DataError(
                "holdout needs at least 2 rows".to_string(),
            ));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        indices.shuffle(&mut rng);

        let n_test = ((n_samples as f64 * HOLDOUT_TEST_FRACTION).ceil() as usize)
            .max(1)
            .min(n_samples - 1);

        Ok(vec![FoldSplit {
            test_indices: indices[..n_test].to_vec(),
            train_indices: indices[n_test..].to_vec(),
            fold_idx: 0,
        }])
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize) -> Result<Vec<FoldSplit>> {
        if n_splits < 2 {
            return Err(DiabevalError::DataError(format!(
                "k-fold needs at least 2 splits, got {}",
                n_splits
            )));
        }
        if n_samples < n_splits {
            return Err(DiabevalError::DataError(format!(
                "cannot split {} rows into {} folds",
                n_samples, n_splits
            )));
        }

        let indices: Vec<usize> = (0..n_samples).collect();

        // Near-equal contiguous groups: the first n % k folds get one
        // extra row.
        let fold_sizes: Vec<usize> = (0..n_splits)
            .map(|i| {
                let base = n_samples / n_splits;
                let remainder = n_samples % n_splits;
                if i < remainder {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for (fold_idx, &fold_size) in fold_sizes.iter().enumerate() {
            let end = current + fold_size;
            let test_indices: Vec<usize> = indices[current..end].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[end..].iter())
                .copied()
                .collect();

            splits.push(FoldSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current = end;
        }

        Ok(splits)
    }

    fn leave_one_out_split(&self, n_samples: usize) -> Result<Vec<FoldSplit>> {
        if n_samples > self.max_loo_samples {
            return Err(DiabevalError::DatasetTooLargeForStrategy {
                strategy: ValidationStrategy::LeaveOneOut.to_string(),
                n_samples,
                limit: self.max_loo_samples,
            });
        }
        if n_samples < 2 {
            return Err(DiabevalError::DataError(
                "leave-one-out needs at least 2 rows".to_string(),
            ));
        }

        Ok((0..n_samples)
            .map(|i| FoldSplit {
                train_indices: (0..n_samples).filter(|&j| j != i).collect(),
                test_indices: vec![i],
                fold_idx: i,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_sorted_test_indices(splits: &[FoldSplit]) -> Vec<usize> {
        let mut all: Vec<usize> = splits
            .iter()
            .flat_map(|s| s.test_indices.iter().copied())
            .collect();
        all.sort_unstable();
        all
    }

    #[test]
    fn test_parse_wire_names() {
        assert_eq!(
            ValidationStrategy::parse("holdout").unwrap(),
            ValidationStrategy::Holdout
        );
        assert_eq!(
            ValidationStrategy::parse("3-FOLD").unwrap(),
            ValidationStrategy::KFold { n_splits: 3 }
        );
        assert_eq!(
            ValidationStrategy::parse("10-fold").unwrap(),
            ValidationStrategy::KFold { n_splits: 10 }
        );
        assert_eq!(
            ValidationStrategy::parse("Leave-One-Out").unwrap(),
            ValidationStrategy::LeaveOneOut
        );
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert!(matches!(
            ValidationStrategy::parse("5-fold"),
            Err(DiabevalError::UnknownStrategy(_))
        ));
        assert!(matches!(
            ValidationStrategy::parse("bootstrap"),
            Err(DiabevalError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_k_fold_test_sets_partition_rows() {
        for &(n, k) in &[(100usize, 3usize), (100, 10), (25, 3), (10, 10)] {
            let splits = Splitter::new(ValidationStrategy::KFold { n_splits: k })
                .split(n)
                .unwrap();

            assert_eq!(splits.len(), k);
            assert_eq!(
                collect_sorted_test_indices(&splits),
                (0..n).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_k_fold_remainder_goes_to_first_folds() {
        let splits = Splitter::new(ValidationStrategy::KFold { n_splits: 3 })
            .split(10)
            .unwrap();

        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);

        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 10);
        }
    }

    #[test]
    fn test_k_fold_train_test_disjoint() {
        let splits = Splitter::new(ValidationStrategy::KFold { n_splits: 3 })
            .split(30)
            .unwrap();

        for split in &splits {
            for idx in &split.test_indices {
                assert!(!split.train_indices.contains(idx));
            }
        }
    }

    #[test]
    fn test_k_fold_too_few_rows_rejected() {
        let result = Splitter::new(ValidationStrategy::KFold { n_splits: 10 }).split(5);
        assert!(result.is_err());
    }

    #[test]
    fn test_leave_one_out_singleton_folds() {
        let splits = Splitter::new(ValidationStrategy::LeaveOneOut)
            .split(5)
            .unwrap();

        assert_eq!(splits.len(), 5);
        for (i, split) in splits.iter().enumerate() {
            assert_eq!(split.test_indices, vec![i]);
            assert_eq!(split.train_indices.len(), 4);
            assert!(!split.train_indices.contains(&i));
        }
        assert_eq!(
            collect_sorted_test_indices(&splits),
            (0..5).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_leave_one_out_ceiling() {
        let splitter = Splitter::new(ValidationStrategy::LeaveOneOut);

        assert!(splitter.split(1000).is_ok());
        assert!(matches!(
            splitter.split(1001),
            Err(DiabevalError::DatasetTooLargeForStrategy {
                n_samples: 1001,
                limit: 1000,
                ..
            })
        ));
    }

    #[test]
    fn test_holdout_sizes_and_disjointness() {
        let splits = Splitter::new(ValidationStrategy::Holdout)
            .with_random_state(42)
            .split(10)
            .unwrap();

        assert_eq!(splits.len(), 1);
        let split = &splits[0];
        assert_eq!(split.test_indices.len(), 2);
        assert_eq!(split.train_indices.len(), 8);

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_holdout_deterministic_for_fixed_seed() {
        let a = Splitter::new(ValidationStrategy::Holdout)
            .with_random_state(7)
            .split(50)
            .unwrap();
        let b = Splitter::new(ValidationStrategy::Holdout)
            .with_random_state(7)
            .split(50)
            .unwrap();

        assert_eq!(a[0].train_indices, b[0].train_indices);
        assert_eq!(a[0].test_indices, b[0].test_indices);

        let c = Splitter::new(ValidationStrategy::Holdout)
            .with_random_state(8)
            .split(50)
            .unwrap();
        assert_ne!(a[0].test_indices, c[0].test_indices);
    }

    #[test]
    fn test_holdout_test_size_rounds_up() {
        let splits = Splitter::new(ValidationStrategy::Holdout)
            .with_random_state(0)
            .split(11)
            .unwrap();
        // ceil(0.2 * 11) = 3
        assert_eq!(splits[0].test_indices.len(), 3);
    }
}
