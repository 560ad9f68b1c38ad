//! Regression tree on coordinates and hour.

use crime_hotspot_modeling_models::{ModelKind, Observation};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

use crate::design::{Predictor, Standardizer, design_matrix, raw_features, targets};
use crate::{ModelError, Regressor, ensure_finite};

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// A fitted regression tree with the library's default stopping rules.
pub struct TreeRegressor {
    model: Tree,
}

impl TreeRegressor {
    /// Fits on raw `longitude, latitude, hour`.
    ///
    /// # Errors
    ///
    /// * [`ModelError::Degenerate`] for a constant or non-finite predictor
    /// * [`ModelError::Fit`] if the tree cannot be grown
    pub fn fit(rows: &[Observation]) -> Result<Self, ModelError> {
        Standardizer::fit(ModelKind::DecisionTree, rows, Predictor::ALL)?;

        let x = features(rows)?;
        let y = targets(rows);
        let model = Tree::fit(&x, &y, DecisionTreeRegressorParameters::default()).map_err(|e| {
            ModelError::Fit {
                model: ModelKind::DecisionTree,
                message: e.to_string(),
            }
        })?;
        Ok(Self { model })
    }
}

fn features(rows: &[Observation]) -> Result<DenseMatrix<f64>, ModelError> {
    let raw: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| raw_features(row, Predictor::ALL))
        .collect();
    design_matrix(ModelKind::DecisionTree, &raw)
}

impl Regressor for TreeRegressor {
    fn kind(&self) -> ModelKind {
        ModelKind::DecisionTree
    }

    fn predict(&self, rows: &[Observation]) -> Result<Vec<f64>, ModelError> {
        let x = features(rows)?;
        let values = self.model.predict(&x).map_err(|e| ModelError::Fit {
            model: ModelKind::DecisionTree,
            message: e.to_string(),
        })?;
        ensure_finite(ModelKind::DecisionTree, &values)?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_rows() -> Vec<Observation> {
        (0..40_u32)
            .map(|i| {
                let x = -71.07 + 0.0005 * f64::from(i);
                Observation {
                    longitude: x,
                    latitude: 42.36 + 0.0001 * f64::from(i % 7),
                    hour: f64::from(i % 24),
                    density: if i < 20 { 2.0 } else { 9.0 },
                }
            })
            .collect()
    }

    #[test]
    fn fits_a_step_function_exactly_on_training_rows() {
        let rows = step_rows();
        let model = TreeRegressor::fit(&rows).unwrap();
        let out = model.predict(&rows).unwrap();
        for (p, r) in out.iter().zip(&rows) {
            assert!((p - r.density).abs() < 1e-9);
        }
    }

    #[test]
    fn refits_are_identical() {
        let rows = step_rows();
        let a = TreeRegressor::fit(&rows).unwrap().predict(&rows).unwrap();
        let b = TreeRegressor::fit(&rows).unwrap().predict(&rows).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constant_latitude_is_degenerate() {
        let rows: Vec<Observation> = step_rows()
            .into_iter()
            .map(|mut r| {
                r.latitude = 42.36;
                r
            })
            .collect();
        assert!(matches!(
            TreeRegressor::fit(&rows),
            Err(ModelError::Degenerate {
                model: ModelKind::DecisionTree,
                ..
            })
        ));
    }
}
