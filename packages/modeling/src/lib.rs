#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Train/test evaluation of density regression models.
//!
//! Splits observations with a caller-supplied seed, fits kNN, linear,
//! decision-tree and polynomial regressors on the training partition,
//! blends kNN and polynomial into two ensembles, cross-validates kNN, and
//! ranks all six predictors by held-out mean squared error.

pub mod design;
pub mod ensemble;
pub mod evaluate;
pub mod knn;
pub mod ols;
pub mod split;
pub mod tree;

use crime_hotspot_modeling_models::{ModelKind, Observation};

pub use evaluate::{BestModel, ModelComparison, compare_models};

/// Errors that can occur while fitting or evaluating models.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Not enough rows for the requested operation.
    #[error("Not enough data for {context}: need at least {needed} rows, got {got}")]
    InsufficientData {
        /// What was being attempted.
        context: String,
        /// Minimum rows required.
        needed: usize,
        /// Rows available.
        got: usize,
    },

    /// Predictors cannot support a fit (constant or non-finite column).
    #[error("{model} predictors are degenerate: {reason}")]
    Degenerate {
        /// Model being fitted.
        model: ModelKind,
        /// Which predictor and why.
        reason: String,
    },

    /// The underlying solver failed.
    #[error("{model} fit failed: {message}")]
    Fit {
        /// Model being fitted.
        model: ModelKind,
        /// Solver error text.
        message: String,
    },

    /// A model produced a NaN or infinite prediction or error.
    #[error("{model} produced a non-finite value")]
    NonFinite {
        /// Offending model.
        model: ModelKind,
    },

    /// Configuration is unusable.
    #[error("Invalid model configuration: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// A fitted density predictor.
pub trait Regressor {
    /// Which model this is.
    fn kind(&self) -> ModelKind;

    /// Predicts density for each row, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if prediction fails or yields a non-finite
    /// value.
    fn predict(&self, rows: &[Observation]) -> Result<Vec<f64>, ModelError>;
}

/// Mean squared error between targets and predictions.
///
/// # Errors
///
/// Returns [`ModelError::InsufficientData`] for empty input and
/// [`ModelError::NonFinite`] if the result is not finite.
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(
    model: ModelKind,
    targets: &[f64],
    predictions: &[f64],
) -> Result<f64, ModelError> {
    if targets.is_empty() || targets.len() != predictions.len() {
        return Err(ModelError::InsufficientData {
            context: format!("{model} error computation"),
            needed: targets.len().max(1),
            got: predictions.len(),
        });
    }
    let sum: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let mse = sum / targets.len() as f64;
    if mse.is_finite() {
        Ok(mse)
    } else {
        Err(ModelError::NonFinite { model })
    }
}

/// Fails with [`ModelError::NonFinite`] if any prediction is NaN or
/// infinite.
///
/// # Errors
///
/// See above.
pub fn ensure_finite(model: ModelKind, values: &[f64]) -> Result<(), ModelError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFinite { model })
    }
}
