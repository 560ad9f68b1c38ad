//! Ordinary least squares on standardized predictors, with an optional
//! degree-2 coordinate expansion.

use crime_hotspot_modeling_models::{ModelKind, Observation};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};

use crate::design::{Predictor, Standardizer, design_matrix, ensure_full_rank, targets};
use crate::{ModelError, Regressor, ensure_finite};

type Ols = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Which terms enter the least-squares fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terms {
    /// `longitude, latitude, hour`.
    Linear,
    /// `x, y, x², xy, y², hour` over standardized coordinates.
    Polynomial,
}

impl Terms {
    #[must_use]
    pub const fn kind(self) -> ModelKind {
        match self {
            Self::Linear => ModelKind::Linear,
            Self::Polynomial => ModelKind::Polynomial,
        }
    }

    /// Number of terms, excluding the intercept.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Linear => 3,
            Self::Polynomial => 6,
        }
    }

    fn expand(self, z: &[f64]) -> Vec<f64> {
        let (x, y, h) = (z[0], z[1], z[2]);
        match self {
            Self::Linear => vec![x, y, h],
            Self::Polynomial => vec![x, y, x * x, x * y, y * y, h],
        }
    }
}

/// A fitted least-squares density model.
pub struct OlsRegressor {
    terms: Terms,
    standardizer: Standardizer,
    model: Ols,
}

impl OlsRegressor {
    /// Fits with the QR solver.
    ///
    /// # Errors
    ///
    /// * [`ModelError::InsufficientData`] if there are not more rows than
    ///   terms
    /// * [`ModelError::Degenerate`] for a constant or non-finite predictor,
    ///   or for terms that are linearly dependent
    /// * [`ModelError::Fit`] if the solver fails
    pub fn fit(rows: &[Observation], terms: Terms) -> Result<Self, ModelError> {
        let kind = terms.kind();
        let needed = terms.width() + 1;
        if rows.len() < needed {
            return Err(ModelError::InsufficientData {
                context: format!("{} fit", kind.label()),
                needed,
                got: rows.len(),
            });
        }

        let standardizer = Standardizer::fit(kind, rows, Predictor::ALL)?;
        let expanded = Self::expand_all(&standardizer, terms, rows);
        ensure_full_rank(kind, &expanded)?;
        let x = design_matrix(kind, &expanded)?;
        let y = targets(rows);

        let params =
            LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::QR);
        let model = Ols::fit(&x, &y, params).map_err(|e| ModelError::Fit {
            model: kind,
            message: e.to_string(),
        })?;

        Ok(Self {
            terms,
            standardizer,
            model,
        })
    }

    fn expand_all(standardizer: &Standardizer, terms: Terms, rows: &[Observation]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| terms.expand(&standardizer.transform(row)))
            .collect()
    }
}

impl Regressor for OlsRegressor {
    fn kind(&self) -> ModelKind {
        self.terms.kind()
    }

    fn predict(&self, rows: &[Observation]) -> Result<Vec<f64>, ModelError> {
        let kind = self.kind();
        let x = design_matrix(kind, &Self::expand_all(&self.standardizer, self.terms, rows))?;
        let values = self.model.predict(&x).map_err(|e| ModelError::Fit {
            model: kind,
            message: e.to_string(),
        })?;
        ensure_finite(kind, &values)?;
        Ok(values)
    }
}
