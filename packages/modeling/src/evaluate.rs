//! Seeded fit, evaluation, and ranking of all six models.

use crime_hotspot_modeling_models::{
    CrossValidationReport, EvaluationResult, ModelConfig, ModelKind, ModelPredictions, Observation,
    Partition,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::ensemble::Blend;
use crate::knn::{KnnRegressor, cross_validate};
use crate::ols::{OlsRegressor, Terms};
use crate::split::{Split, train_test_split};
use crate::tree::TreeRegressor;
use crate::{ModelError, Regressor, mean_squared_error};

/// The rank-1 model and its prediction for every row.
#[derive(Debug, Clone, PartialEq)]
pub struct BestModel {
    /// Which model won.
    pub model: ModelKind,
    /// Its predictions, in row order.
    pub predictions: Vec<f64>,
}

/// Everything produced by one seeded evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelComparison {
    /// Row indices on each side of the split.
    pub split: Split,
    /// kNN cross-validation on the training partition.
    pub cross_validation: CrossValidationReport,
    /// Held-out errors, in evaluation order.
    pub results: Vec<EvaluationResult>,
    /// Held-out errors, ascending by MSE. Ties keep evaluation order.
    pub ranking: Vec<EvaluationResult>,
    /// Every model's prediction for every row, in evaluation order.
    pub predictions: Vec<ModelPredictions>,
    /// The first entry of `ranking` with its predictions.
    pub best: BestModel,
}

impl ModelComparison {
    /// Predictions of one model, if it was evaluated.
    #[must_use]
    pub fn predictions_for(&self, model: ModelKind) -> Option<&[f64]> {
        self.predictions
            .iter()
            .find(|p| p.model == model)
            .map(|p| p.values.as_slice())
    }

    /// Partition label for each of `n` rows.
    #[must_use]
    pub fn partitions(&self, n: usize) -> Vec<Partition> {
        let mut labels = vec![Partition::Train; n];
        for &i in &self.split.test {
            if let Some(label) = labels.get_mut(i) {
                *label = Partition::Test;
            }
        }
        labels
    }
}

/// Checks the model settings for unusable values.
///
/// # Errors
///
/// Returns [`ModelError::Config`] describing the first problem found.
pub fn validate_config(config: &ModelConfig) -> Result<(), ModelError> {
    let problem = if config.test_fraction.is_nan()
        || config.test_fraction <= 0.0
        || config.test_fraction >= 1.0
    {
        Some(format!(
            "test_fraction must be in (0, 1), got {}",
            config.test_fraction
        ))
    } else if config.knn_neighbors == 0 {
        Some("knn_neighbors must be at least 1".to_string())
    } else if config.cv_folds < 2 {
        Some(format!("cv_folds must be at least 2, got {}", config.cv_folds))
    } else if !config.ensemble_knn_weight.is_finite()
        || !config.ensemble_polynomial_weight.is_finite()
    {
        Some("ensemble weights must be finite".to_string())
    } else {
        None
    };
    problem.map_or(Ok(()), |message| Err(ModelError::Config { message }))
}

/// Splits `rows`, cross-validates kNN on the training partition, fits all
/// models on it, and ranks them by test MSE.
///
/// All randomness comes from one generator seeded with `seed`: the split is
/// drawn first, then the folds.
///
/// # Errors
///
/// Returns the first [`ModelError`] from validation, splitting, cross
/// validation, any fit, or any prediction. No model is silently skipped.
pub fn compare_models(
    rows: &[Observation],
    config: &ModelConfig,
    seed: u64,
) -> Result<ModelComparison, ModelError> {
    validate_config(config)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let split = train_test_split(rows.len(), config.test_fraction, &mut rng)?;
    let train: Vec<Observation> = split.train.iter().map(|&i| rows[i]).collect();
    let test_targets: Vec<f64> = split.test.iter().map(|&i| rows[i].density).collect();

    log::info!(
        "Evaluating models on {} training / {} test incidents (seed {seed})",
        train.len(),
        split.test.len()
    );

    let cross_validation = cross_validate(&train, config.knn_neighbors, config.cv_folds, &mut rng)?;

    let knn = KnnRegressor::fit(&train, config.knn_neighbors)?;
    let linear = OlsRegressor::fit(&train, Terms::Linear)?;
    let tree = TreeRegressor::fit(&train)?;
    let polynomial = OlsRegressor::fit(&train, Terms::Polynomial)?;

    let fitted: [&dyn Regressor; 4] = [&knn, &linear, &tree, &polynomial];
    let mut predictions = Vec::with_capacity(ModelKind::all().len());
    for model in fitted {
        predictions.push(ModelPredictions {
            model: model.kind(),
            values: model.predict(rows)?,
        });
    }

    let knn_values = knn.predict(rows)?;
    let polynomial_values = polynomial.predict(rows)?;
    for blend in [
        Blend::Mean,
        Blend::Weighted {
            knn_weight: config.ensemble_knn_weight,
            polynomial_weight: config.ensemble_polynomial_weight,
        },
    ] {
        predictions.push(ModelPredictions {
            model: blend.kind(),
            values: blend.combine(&knn_values, &polynomial_values)?,
        });
    }

    let mut results = Vec::with_capacity(predictions.len());
    for prediction in &predictions {
        let held_out: Vec<f64> = split.test.iter().map(|&i| prediction.values[i]).collect();
        let mse = mean_squared_error(prediction.model, &test_targets, &held_out)?;
        let rmse = mse.sqrt();
        log::debug!(
            "{}: test MSE {mse:.4}, RMSE {rmse:.4}",
            prediction.model.label()
        );
        results.push(EvaluationResult {
            model: prediction.model,
            mse,
            rmse,
        });
    }

    let ranking = rank(&results);
    let Some(winner) = ranking.first() else {
        return Err(ModelError::InsufficientData {
            context: "model ranking".to_string(),
            needed: 1,
            got: 0,
        });
    };
    let best = BestModel {
        model: winner.model,
        predictions: predictions
            .iter()
            .find(|p| p.model == winner.model)
            .map(|p| p.values.clone())
            .unwrap_or_default(),
    };
    log::info!(
        "Best model: {} (test MSE {:.4}, RMSE {:.4})",
        best.model.label(),
        winner.mse,
        winner.rmse
    );

    Ok(ModelComparison {
        split,
        cross_validation,
        results,
        ranking,
        predictions,
        best,
    })
}

/// Sorts results ascending by MSE. The sort is stable, so exact ties keep
/// their input order.
#[must_use]
pub fn rank(results: &[EvaluationResult]) -> Vec<EvaluationResult> {
    let mut ranking = results.to_vec();
    ranking.sort_by(|a, b| a.mse.total_cmp(&b.mse));
    ranking
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn scattered(n: usize, seed: u64) -> Vec<Observation> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let longitude: f64 = rng.random_range(-71.066..-71.058);
                let latitude: f64 = rng.random_range(42.362..42.369);
                let hour = f64::from(rng.random_range(0..24_u32));
                let dx = (longitude + 71.062) * 1000.0;
                let dy = (latitude - 42.3655) * 1000.0;
                let density = (12.0 - dx * dx - dy * dy).max(0.0) + rng.random_range(0.0..1.0_f64);
                Observation {
                    longitude,
                    latitude,
                    hour,
                    density,
                }
            })
            .collect()
    }

    #[test]
    fn evaluates_every_model_in_order_and_ranks_by_mse() {
        let rows = scattered(200, 5);
        let comparison = compare_models(&rows, &ModelConfig::default(), 42).unwrap();

        let evaluated: Vec<ModelKind> = comparison.results.iter().map(|r| r.model).collect();
        assert_eq!(evaluated, ModelKind::all());
        assert_eq!(comparison.split.test.len(), 40);
        assert_eq!(comparison.cross_validation.fold_mse.len(), 5);

        for pair in comparison.ranking.windows(2) {
            assert!(pair[0].mse <= pair[1].mse);
        }
        for result in &comparison.results {
            assert!(result.mse.is_finite());
            assert!((result.rmse - result.mse.sqrt()).abs() < 1e-12);
        }
        assert_eq!(comparison.best.model, comparison.ranking[0].model);
        assert_eq!(
            comparison.predictions_for(comparison.best.model).unwrap(),
            comparison.best.predictions.as_slice()
        );
    }

    #[test]
    fn same_seed_reproduces_split_folds_and_errors() {
        let rows = scattered(150, 9);
        let a = compare_models(&rows, &ModelConfig::default(), 7).unwrap();
        let b = compare_models(&rows, &ModelConfig::default(), 7).unwrap();
        assert_eq!(a, b);

        let c = compare_models(&rows, &ModelConfig::default(), 8).unwrap();
        assert_ne!(a.split, c.split);
    }

    #[test]
    #[allow(clippy::float_cmp, clippy::suboptimal_flops)]
    fn ensembles_are_exact_blends_on_every_row() {
        let rows = scattered(120, 2);
        let comparison = compare_models(&rows, &ModelConfig::default(), 1).unwrap();
        let knn = comparison.predictions_for(ModelKind::Knn).unwrap();
        let poly = comparison.predictions_for(ModelKind::Polynomial).unwrap();
        let mean = comparison.predictions_for(ModelKind::EnsembleMean).unwrap();
        let weighted = comparison
            .predictions_for(ModelKind::EnsembleWeighted)
            .unwrap();

        for &i in &comparison.split.test {
            assert_eq!(mean[i], (knn[i] + poly[i]) / 2.0);
            assert_eq!(weighted[i], 0.7 * knn[i] + 0.3 * poly[i]);
        }
    }

    #[test]
    fn partitions_label_held_out_rows() {
        let rows = scattered(50, 3);
        let comparison = compare_models(&rows, &ModelConfig::default(), 3).unwrap();
        let labels = comparison.partitions(rows.len());
        let tests = labels.iter().filter(|p| **p == Partition::Test).count();
        assert_eq!(tests, comparison.split.test.len());
    }

    #[test]
    fn constant_hour_fails_loudly_instead_of_ranking_nan() {
        let rows: Vec<Observation> = scattered(100, 4)
            .into_iter()
            .map(|mut r| {
                r.hour = 6.0;
                r
            })
            .collect();
        assert!(matches!(
            compare_models(&rows, &ModelConfig::default(), 1),
            Err(ModelError::Degenerate { .. })
        ));
    }

    #[test]
    fn ranking_is_stable_for_exact_ties() {
        let results = vec![
            EvaluationResult {
                model: ModelKind::Knn,
                mse: 2.0,
                rmse: 2.0_f64.sqrt(),
            },
            EvaluationResult {
                model: ModelKind::Linear,
                mse: 1.0,
                rmse: 1.0,
            },
            EvaluationResult {
                model: ModelKind::Polynomial,
                mse: 1.0,
                rmse: 1.0,
            },
        ];
        let ranked: Vec<ModelKind> = rank(&results).iter().map(|r| r.model).collect();
        assert_eq!(
            ranked,
            vec![ModelKind::Linear, ModelKind::Polynomial, ModelKind::Knn]
        );
    }

    #[test]
    fn invalid_config_is_rejected_before_fitting() {
        let config = ModelConfig {
            cv_folds: 1,
            ..ModelConfig::default()
        };
        assert!(matches!(
            compare_models(&scattered(50, 1), &config, 0),
            Err(ModelError::Config { .. })
        ));
    }
}
