//! Predictor extraction, variance checks, and design matrices.

use crime_hotspot_modeling_models::{ModelKind, Observation};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linalg::traits::svd::SVDDecomposable;

use crate::ModelError;

/// An input column a model can regress on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    /// Incident longitude in degrees.
    Longitude,
    /// Incident latitude in degrees.
    Latitude,
    /// Hour of day, 0-23.
    Hour,
}

impl Predictor {
    /// Coordinates only, as used by kNN.
    pub const COORDINATES: &'static [Self] = &[Self::Longitude, Self::Latitude];

    /// Coordinates and hour, as used by the linear, tree and polynomial
    /// models.
    pub const ALL: &'static [Self] = &[Self::Longitude, Self::Latitude, Self::Hour];

    #[must_use]
    pub const fn value(self, row: &Observation) -> f64 {
        match self {
            Self::Longitude => row.longitude,
            Self::Latitude => row.latitude,
            Self::Hour => row.hour,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Longitude => "longitude",
            Self::Latitude => "latitude",
            Self::Hour => "hour",
        }
    }
}

/// Per-column training mean and population standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    predictors: Vec<Predictor>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    /// Fits column statistics on `rows`.
    ///
    /// # Errors
    ///
    /// * [`ModelError::InsufficientData`] if `rows` is empty
    /// * [`ModelError::Degenerate`] if any column holds a non-finite value or
    ///   has zero variance
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(
        model: ModelKind,
        rows: &[Observation],
        predictors: &[Predictor],
    ) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::InsufficientData {
                context: format!("{} fit", model.label()),
                needed: 1,
                got: 0,
            });
        }
        let n = rows.len() as f64;
        let mut means = Vec::with_capacity(predictors.len());
        let mut scales = Vec::with_capacity(predictors.len());

        for predictor in predictors {
            let values = rows.iter().map(|row| predictor.value(row));
            if values.clone().any(|v| !v.is_finite()) {
                return Err(ModelError::Degenerate {
                    model,
                    reason: format!("{} contains a non-finite value", predictor.name()),
                });
            }
            let mean = values.clone().sum::<f64>() / n;
            let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            // Constant columns leave rounding residue in the spread.
            if std.is_nan() || std <= 1e-12 * mean.abs().max(1.0) {
                return Err(ModelError::Degenerate {
                    model,
                    reason: format!("{} has zero variance", predictor.name()),
                });
            }
            means.push(mean);
            scales.push(std);
        }

        Ok(Self {
            predictors: predictors.to_vec(),
            means,
            scales,
        })
    }

    /// Standardized predictor values for one row.
    #[must_use]
    pub fn transform(&self, row: &Observation) -> Vec<f64> {
        self.predictors
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(predictor, (mean, scale))| (predictor.value(row) - mean) / scale)
            .collect()
    }
}

/// Raw predictor values for one row.
#[must_use]
pub fn raw_features(row: &Observation, predictors: &[Predictor]) -> Vec<f64> {
    predictors.iter().map(|p| p.value(row)).collect()
}

/// Row-major design matrix from equally sized feature rows.
///
/// # Errors
///
/// Returns [`ModelError::InsufficientData`] if there are no rows or no
/// columns.
pub fn design_matrix(model: ModelKind, rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, ModelError> {
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.is_empty() || ncols == 0 {
        return Err(ModelError::InsufficientData {
            context: format!("{} design matrix", model.label()),
            needed: 1,
            got: rows.len(),
        });
    }
    let data: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(DenseMatrix::new(rows.len(), ncols, data, false))
}

/// Smallest-to-largest singular value ratio below which a design is
/// treated as rank deficient.
pub const MIN_CONDITION_RATIO: f64 = 1e-10;

/// Rejects feature rows whose columns, together with an intercept, are
/// linearly dependent.
///
/// Columns are scaled to unit norm before the singular values are taken, so
/// the check does not depend on predictor units.
///
/// # Errors
///
/// * [`ModelError::Degenerate`] if the design is rank deficient
/// * [`ModelError::Fit`] if the decomposition fails
/// * [`ModelError::InsufficientData`] if there are no rows or no columns
pub fn ensure_full_rank(model: ModelKind, rows: &[Vec<f64>]) -> Result<(), ModelError> {
    let ncols = rows.first().map_or(0, Vec::len) + 1;
    let with_intercept: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| std::iter::once(1.0).chain(row.iter().copied()).collect())
        .collect();

    let mut norms = vec![0.0_f64; ncols];
    for row in &with_intercept {
        for (norm, value) in norms.iter_mut().zip(row) {
            *norm = value.mul_add(*value, *norm);
        }
    }
    let scaled: Vec<Vec<f64>> = with_intercept
        .iter()
        .map(|row| {
            row.iter()
                .zip(&norms)
                .map(|(value, norm)| if *norm > 0.0 { value / norm.sqrt() } else { 0.0 })
                .collect()
        })
        .collect();

    let matrix = design_matrix(model, &scaled)?;
    let svd = matrix.svd().map_err(|e| ModelError::Fit {
        model,
        message: e.to_string(),
    })?;

    let largest = svd.s.iter().copied().fold(0.0_f64, f64::max);
    let smallest = svd.s.iter().copied().fold(f64::INFINITY, f64::min);
    if svd.s.len() < ncols || largest <= 0.0 || smallest / largest < MIN_CONDITION_RATIO {
        return Err(ModelError::Degenerate {
            model,
            reason: format!(
                "design columns are collinear (singular value ratio {:.3e})",
                if largest > 0.0 { smallest / largest } else { 0.0 }
            ),
        });
    }
    log::debug!(
        "{} design singular value ratio {:.3e}",
        model.label(),
        smallest / largest
    );
    Ok(())
}

/// Density targets, in row order.
#[must_use]
pub fn targets(rows: &[Observation]) -> Vec<f64> {
    rows.iter().map(|row| row.density).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(longitude: f64, latitude: f64, hour: f64) -> Observation {
        Observation {
            longitude,
            latitude,
            hour,
            density: 0.0,
        }
    }

    #[test]
    fn standardized_columns_have_zero_mean_and_unit_std() {
        let rows = vec![
            obs(-71.06, 42.36, 1.0),
            obs(-71.05, 42.37, 5.0),
            obs(-71.04, 42.38, 9.0),
        ];
        let standardizer = Standardizer::fit(ModelKind::Linear, &rows, Predictor::ALL).unwrap();
        let transformed: Vec<Vec<f64>> = rows.iter().map(|r| standardizer.transform(r)).collect();

        for col in 0..3 {
            let values: Vec<f64> = transformed.iter().map(|r| r[col]).collect();
            let mean = values.iter().sum::<f64>() / 3.0;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-9);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_column_is_degenerate() {
        let rows = vec![obs(-71.06, 42.36, 3.0), obs(-71.05, 42.37, 3.0)];
        let err = Standardizer::fit(ModelKind::Linear, &rows, Predictor::ALL).unwrap_err();
        assert!(matches!(err, ModelError::Degenerate { ref reason, .. } if reason.contains("hour")));

        assert!(Standardizer::fit(ModelKind::Knn, &rows, Predictor::COORDINATES).is_ok());
    }

    #[test]
    fn repeated_coordinate_is_degenerate_despite_rounding() {
        let rows = vec![obs(-71.0606, 42.36, 1.0); 7];
        assert!(matches!(
            Standardizer::fit(ModelKind::Knn, &rows, Predictor::COORDINATES),
            Err(ModelError::Degenerate { .. })
        ));
    }

    #[test]
    fn nan_predictor_is_degenerate() {
        let rows = vec![obs(f64::NAN, 42.36, 1.0), obs(-71.05, 42.37, 2.0)];
        assert!(matches!(
            Standardizer::fit(ModelKind::Polynomial, &rows, Predictor::ALL),
            Err(ModelError::Degenerate { .. })
        ));
    }

    #[test]
    fn design_matrix_rejects_empty_rows() {
        assert!(design_matrix(ModelKind::Linear, &[]).is_err());
        assert!(design_matrix(ModelKind::Linear, &[vec![1.0, 2.0], vec![3.0, 4.0]]).is_ok());
    }
}
