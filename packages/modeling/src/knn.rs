//! k-nearest-neighbour density regression on coordinates.

use crime_hotspot_modeling_models::{CrossValidationReport, ModelKind, Observation};
use rand::Rng;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::design::{Predictor, Standardizer};
use crate::split::k_fold;
use crate::{ModelError, Regressor, ensure_finite, mean_squared_error};

/// A training coordinate tagged with its row position.
type TrainingPoint = GeomWithData<[f64; 2], usize>;

/// Indexes the training coordinates in an R-tree; predicts the uniform mean
/// density of the `k` closest training rows.
#[derive(Debug, Clone)]
pub struct KnnRegressor {
    k: usize,
    tree: RTree<TrainingPoint>,
    densities: Vec<f64>,
}

impl KnnRegressor {
    /// Fits on `rows` in the given order. Distance ties resolve to the
    /// earlier training row.
    ///
    /// # Errors
    ///
    /// * [`ModelError::Config`] if `k == 0`
    /// * [`ModelError::InsufficientData`] if there are fewer than `k` rows
    /// * [`ModelError::Degenerate`] if coordinates are constant or
    ///   non-finite
    pub fn fit(rows: &[Observation], k: usize) -> Result<Self, ModelError> {
        if k == 0 {
            return Err(ModelError::Config {
                message: "knn_neighbors must be at least 1".to_string(),
            });
        }
        if rows.len() < k {
            return Err(ModelError::InsufficientData {
                context: format!("{k}-nearest-neighbour fit"),
                needed: k,
                got: rows.len(),
            });
        }
        Standardizer::fit(ModelKind::Knn, rows, Predictor::COORDINATES)?;

        Ok(Self {
            k,
            tree: RTree::bulk_load(
                rows.iter()
                    .enumerate()
                    .map(|(i, r)| TrainingPoint::new([r.longitude, r.latitude], i))
                    .collect(),
            ),
            densities: rows.iter().map(|r| r.density).collect(),
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict_one(&self, query: [f64; 2]) -> f64 {
        // Everything tied with the k-th distance is collected so the
        // earliest training rows win the tie.
        let mut nearest: Vec<(f64, usize)> = Vec::with_capacity(self.k + 1);
        for (point, distance_2) in self.tree.nearest_neighbor_iter_with_distance_2(&query) {
            if nearest.len() >= self.k && nearest[self.k - 1].0 < distance_2 {
                break;
            }
            nearest.push((distance_2, point.data));
        }
        nearest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let sum: f64 = nearest
            .iter()
            .take(self.k)
            .map(|&(_, i)| self.densities[i])
            .sum();
        sum / self.k as f64
    }
}

impl Regressor for KnnRegressor {
    fn kind(&self) -> ModelKind {
        ModelKind::Knn
    }

    fn predict(&self, rows: &[Observation]) -> Result<Vec<f64>, ModelError> {
        let values: Vec<f64> = rows
            .iter()
            .map(|r| self.predict_one([r.longitude, r.latitude]))
            .collect();
        ensure_finite(ModelKind::Knn, &values)?;
        Ok(values)
    }
}

/// k-fold cross-validation of the kNN model over `rows`.
///
/// Folds are drawn from `rng`; each fold is validated against a model fitted
/// on the remaining rows.
///
/// # Errors
///
/// Propagates fold construction, fit, and error-computation failures.
#[allow(clippy::cast_precision_loss)]
pub fn cross_validate<R: Rng + ?Sized>(
    rows: &[Observation],
    k: usize,
    folds: usize,
    rng: &mut R,
) -> Result<CrossValidationReport, ModelError> {
    let assignments = k_fold(rows.len(), folds, rng)?;
    let mut in_fold = vec![0_usize; rows.len()];
    for (fold, members) in assignments.iter().enumerate() {
        for &position in members {
            in_fold[position] = fold;
        }
    }

    let mut fold_mse = Vec::with_capacity(folds);
    for (fold, members) in assignments.iter().enumerate() {
        let training: Vec<Observation> = rows
            .iter()
            .zip(&in_fold)
            .filter(|&(_, &f)| f != fold)
            .map(|(row, _)| *row)
            .collect();
        let validation: Vec<Observation> = members.iter().map(|&i| rows[i]).collect();

        let model = KnnRegressor::fit(&training, k)?;
        let predictions = model.predict(&validation)?;
        let targets: Vec<f64> = validation.iter().map(|r| r.density).collect();
        let mse = mean_squared_error(ModelKind::Knn, &targets, &predictions)?;
        log::debug!("kNN fold {}/{folds}: MSE {mse:.4}", fold + 1);
        fold_mse.push(mse);
    }

    let n = fold_mse.len() as f64;
    let mean_mse = fold_mse.iter().sum::<f64>() / n;
    let std_mse = (fold_mse.iter().map(|m| (m - mean_mse).powi(2)).sum::<f64>() / n).sqrt();
    log::info!("kNN {folds}-fold CV: mean MSE {mean_mse:.4} (std {std_mse:.4})");

    Ok(CrossValidationReport {
        fold_mse,
        mean_mse,
        std_mse,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn obs(longitude: f64, latitude: f64, density: f64) -> Observation {
        Observation {
            longitude,
            latitude,
            hour: 0.0,
            density,
        }
    }

    fn line(n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                let x = f64::from(u32::try_from(i).unwrap());
                obs(x, 0.5 * x, x)
            })
            .collect()
    }

    #[test]
    fn predicts_mean_of_nearest_training_densities() {
        let model = KnnRegressor::fit(&line(10), 3).unwrap();
        let out = model.predict(&[obs(5.1, 2.55, 0.0)]).unwrap();
        // Nearest rows are 5, 6 and 4.
        assert!((out[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn distance_ties_prefer_earlier_training_rows() {
        let rows = vec![
            obs(1.0, 0.0, 10.0),
            obs(-1.0, 0.0, 20.0),
            obs(0.0, 1.0, 30.0),
            obs(5.0, 5.0, 40.0),
        ];
        let model = KnnRegressor::fit(&rows, 2).unwrap();
        let out = model.predict(&[obs(0.0, 0.0, 0.0)]).unwrap();
        assert!((out[0] - 15.0).abs() < 1e-12);
    }

    #[test]
    fn ties_at_the_kth_distance_keep_the_earliest_rows() {
        let mut rows: Vec<Observation> = (0..8)
            .map(|i| obs(0.0, 1.0, f64::from(i)))
            .collect();
        rows.push(obs(0.0, 0.5, 100.0));
        rows.push(obs(3.0, 3.0, 0.0));
        let model = KnnRegressor::fit(&rows, 3).unwrap();
        let out = model.predict(&[obs(0.0, 0.0, 0.0)]).unwrap();
        // Row 8 is closest, then rows 0 and 1 out of the eight tied rows.
        assert!((out[0] - 101.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn fit_rejects_fewer_rows_than_k_and_constant_coordinates() {
        assert!(matches!(
            KnnRegressor::fit(&line(3), 5),
            Err(ModelError::InsufficientData { .. })
        ));
        let constant = vec![obs(1.0, 1.0, 1.0); 6];
        assert!(matches!(
            KnnRegressor::fit(&constant, 5),
            Err(ModelError::Degenerate { .. })
        ));
    }

    #[test]
    fn cross_validation_reports_one_mse_per_fold_and_is_seeded() {
        let rows = line(40);
        let a = cross_validate(&rows, 5, 5, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = cross_validate(&rows, 5, 5, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fold_mse.len(), 5);

        let mean = a.fold_mse.iter().sum::<f64>() / 5.0;
        assert!((a.mean_mse - mean).abs() < 1e-12);
        assert!(a.std_mse >= 0.0);
    }
}
