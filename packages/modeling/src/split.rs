//! Seeded train/test and k-fold partitioning.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Row indices on each side of a train/test split, each ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Rows used for fitting.
    pub train: Vec<usize>,
    /// Held-out rows.
    pub test: Vec<usize>,
}

/// Number of held-out rows for `n` rows: `ceil(test_fraction * n)`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    ((test_fraction * n as f64).ceil() as usize).min(n)
}

/// Samples `ceil(test_fraction * n)` rows without replacement for the test
/// partition; the rest form the training partition.
///
/// # Errors
///
/// * [`ModelError::Config`] if `test_fraction` is not inside `(0, 1)`
/// * [`ModelError::InsufficientData`] if either side would be empty
pub fn train_test_split<R: Rng + ?Sized>(
    n: usize,
    test_fraction: f64,
    rng: &mut R,
) -> Result<Split, ModelError> {
    if test_fraction.is_nan() || test_fraction <= 0.0 || test_fraction >= 1.0 {
        return Err(ModelError::Config {
            message: format!("test_fraction must be in (0, 1), got {test_fraction}"),
        });
    }
    let n_test = test_size(n, test_fraction);
    if n < 2 || n_test == 0 || n_test >= n {
        return Err(ModelError::InsufficientData {
            context: "train/test split".to_string(),
            needed: 2,
            got: n,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut test = order[..n_test].to_vec();
    let mut train = order[n_test..].to_vec();
    test.sort_unstable();
    train.sort_unstable();

    log::debug!("Split {n} rows into {} train / {} test", train.len(), n_test);
    Ok(Split { train, test })
}

/// Shuffles positions `0..n` and deals them into `k` folds. The first
/// `n % k` folds hold one extra position. Each fold is ascending.
///
/// # Errors
///
/// * [`ModelError::Config`] if `k < 2`
/// * [`ModelError::InsufficientData`] if `n < k`
pub fn k_fold<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>, ModelError> {
    if k < 2 {
        return Err(ModelError::Config {
            message: format!("cross-validation needs at least 2 folds, got {k}"),
        });
    }
    if n < k {
        return Err(ModelError::InsufficientData {
            context: format!("{k}-fold cross-validation"),
            needed: k,
            got: n,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let mut members = order[start..start + size].to_vec();
        members.sort_unstable();
        folds.push(members);
        start += size;
    }
    Ok(folds)
}
