#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Model kinds, observations, and evaluation result types for density
//! regression.
//!
//! The six predictors are a closed set, so the best model is identified by
//! a [`ModelKind`] tag rather than by name.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the six density predictors, in evaluation order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelKind {
    /// k-nearest-neighbour regression on coordinates.
    Knn,
    /// Ordinary least squares on longitude, latitude, hour.
    Linear,
    /// Regression tree on longitude, latitude, hour.
    DecisionTree,
    /// Degree-2 coordinate polynomial plus linear hour.
    Polynomial,
    /// Mean of kNN and polynomial predictions.
    EnsembleMean,
    /// Weighted blend of kNN and polynomial predictions.
    EnsembleWeighted,
}

impl ModelKind {
    /// All kinds in evaluation order. Ranking ties resolve to the earlier
    /// entry.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Knn,
            Self::Linear,
            Self::DecisionTree,
            Self::Polynomial,
            Self::EnsembleMean,
            Self::EnsembleWeighted,
        ]
    }

    /// Human-readable label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Knn => "kNN",
            Self::Linear => "Linear",
            Self::DecisionTree => "Decision Tree",
            Self::Polynomial => "Polynomial",
            Self::EnsembleMean => "Ensemble (mean)",
            Self::EnsembleWeighted => "Ensemble (weighted)",
        }
    }
}

/// Model-ready view of one incident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Observation {
    /// Longitude (degrees).
    pub longitude: f64,
    /// Latitude (degrees).
    pub latitude: f64,
    /// Hour of day.
    pub hour: f64,
    /// Regression target: neighbour count.
    pub density: f64,
}

/// Which side of the train/test split a row landed on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Partition {
    /// Used to fit models.
    Train,
    /// Held out for evaluation.
    Test,
}

/// Held-out error for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluationResult {
    /// Which model.
    pub model: ModelKind,
    /// Mean squared error on the test partition.
    pub mse: f64,
    /// Square root of `mse`.
    pub rmse: f64,
}

/// k-fold cross-validation of the kNN model on the training partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CrossValidationReport {
    /// Per-fold validation MSE, in fold order.
    pub fold_mse: Vec<f64>,
    /// Mean of `fold_mse`.
    pub mean_mse: f64,
    /// Population standard deviation of `fold_mse`.
    pub std_mse: f64,
}

/// A model's predicted density for every incident, in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelPredictions {
    /// Which model.
    pub model: ModelKind,
    /// One prediction per incident.
    pub values: Vec<f64>,
}

/// Model training and evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ModelConfig {
    /// Share of incidents held out for testing.
    pub test_fraction: f64,
    /// Neighbours used by the kNN model.
    pub knn_neighbors: usize,
    /// Cross-validation folds for the kNN model.
    pub cv_folds: usize,
    /// kNN weight in the weighted ensemble.
    pub ensemble_knn_weight: f64,
    /// Polynomial weight in the weighted ensemble.
    pub ensemble_polynomial_weight: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            knn_neighbors: 5,
            cv_folds: 5,
            ensemble_knn_weight: 0.7,
            ensemble_polynomial_weight: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_order_starts_with_knn_and_covers_every_kind() {
        let all = ModelKind::all();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], ModelKind::Knn);
        assert_eq!(all[5], ModelKind::EnsembleWeighted);
    }

    #[test]
    fn kinds_round_trip_through_their_column_names() {
        for kind in ModelKind::all() {
            let parsed: ModelKind = kind.as_ref().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
        assert_eq!(ModelKind::DecisionTree.to_string(), "decision_tree");
        assert_eq!(ModelKind::EnsembleMean.label(), "Ensemble (mean)");
    }
}
