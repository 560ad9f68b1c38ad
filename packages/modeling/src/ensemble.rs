//! Blends of kNN and polynomial predictions.

use crime_hotspot_modeling_models::ModelKind;

use crate::{ModelError, ensure_finite};

/// How two prediction vectors are combined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blend {
    /// `(knn + polynomial) / 2`.
    Mean,
    /// `knn_weight * knn + polynomial_weight * polynomial`.
    Weighted {
        knn_weight: f64,
        polynomial_weight: f64,
    },
}

impl Blend {
    #[must_use]
    pub const fn kind(self) -> ModelKind {
        match self {
            Self::Mean => ModelKind::EnsembleMean,
            Self::Weighted { .. } => ModelKind::EnsembleWeighted,
        }
    }

    /// Combines the two vectors element-wise.
    ///
    /// # Errors
    ///
    /// * [`ModelError::InsufficientData`] if the lengths differ
    /// * [`ModelError::NonFinite`] if a blended value is not finite
    #[allow(clippy::suboptimal_flops)]
    pub fn combine(self, knn: &[f64], polynomial: &[f64]) -> Result<Vec<f64>, ModelError> {
        if knn.len() != polynomial.len() {
            return Err(ModelError::InsufficientData {
                context: format!("{} blend", self.kind().label()),
                needed: knn.len(),
                got: polynomial.len(),
            });
        }
        let values: Vec<f64> = match self {
            Self::Mean => knn
                .iter()
                .zip(polynomial)
                .map(|(k, p)| (k + p) / 2.0)
                .collect(),
            Self::Weighted {
                knn_weight,
                polynomial_weight,
            } => knn
                .iter()
                .zip(polynomial)
                .map(|(k, p)| knn_weight * k + polynomial_weight * p)
                .collect(),
        };
        ensure_finite(self.kind(), &values)?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp, clippy::suboptimal_flops)]
    fn blends_match_their_formulas_exactly() {
        let knn = [1.2, 3.4, 0.0, 7.75];
        let poly = [0.9, 4.1, 2.2, 6.5];

        let mean = Blend::Mean.combine(&knn, &poly).unwrap();
        let weighted = Blend::Weighted {
            knn_weight: 0.7,
            polynomial_weight: 0.3,
        }
        .combine(&knn, &poly)
        .unwrap();

        for i in 0..knn.len() {
            assert_eq!(mean[i], (knn[i] + poly[i]) / 2.0);
            assert_eq!(weighted[i], 0.7 * knn[i] + 0.3 * poly[i]);
        }
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(Blend::Mean.combine(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn infinite_input_is_not_finite() {
        assert!(matches!(
            Blend::Mean.combine(&[f64::INFINITY], &[1.0]),
            Err(ModelError::NonFinite {
                model: ModelKind::EnsembleMean
            })
        ));
    }
}
