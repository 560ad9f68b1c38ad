#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Local incident density estimation.
//!
//! Builds an R-tree over incident coordinates and answers, for every
//! incident, how many *other* incidents lie within a radius. Distances are
//! plain Euclidean distances in coordinate degrees, not geodesic metres.
//! Also provides the radius-sensitivity summary used to calibrate the
//! operating radius.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

/// Errors that can occur while computing densities.
#[derive(Debug, thiserror::Error)]
pub enum DensityError {
    /// Radius is zero, negative, or not finite.
    #[error("Invalid density radius {radius}: must be a positive finite number of degrees")]
    InvalidRadius {
        /// The rejected radius.
        radius: f64,
    },

    /// An incident has a NaN or infinite coordinate.
    #[error("Incident {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Row position of the offending incident.
        index: usize,
    },

    /// Summary statistics were requested for an empty incident set.
    #[error("Cannot summarize density over zero incidents")]
    Empty,
}

/// Density calibration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DensityConfig {
    /// Radii (degrees) evaluated in the sensitivity report.
    pub candidate_radii: Vec<f64>,
    /// Operating radius (degrees) whose densities feed the models.
    pub radius: f64,
    /// Fixed approximate conversion used only for reporting.
    pub meters_per_degree: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            candidate_radii: vec![0.001, 0.002, 0.003, 0.004],
            radius: 0.002,
            meters_per_degree: 100_000.0,
        }
    }
}

/// An incident position stored in the R-tree with its row position.
#[derive(Debug, Clone, Copy)]
struct IncidentPoint {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for IncidentPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IncidentPoint {
    // Same summation order as `AABB::distance_2` so leaf and envelope
    // pruning agree exactly at the boundary.
    #[allow(clippy::suboptimal_flops)]
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over `(longitude, latitude)` positions.
///
/// Built once per incident set and queried for any number of radii.
pub struct DensityIndex {
    tree: RTree<IncidentPoint>,
    positions: Vec<[f64; 2]>,
}

impl DensityIndex {
    /// Bulk-loads the index.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::NonFiniteCoordinate`] if any position has a
    /// NaN or infinite component.
    pub fn new(positions: &[[f64; 2]]) -> Result<Self, DensityError> {
        if let Some(index) = positions
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(DensityError::NonFiniteCoordinate { index });
        }

        let entries = positions
            .iter()
            .enumerate()
            .map(|(index, &position)| IncidentPoint { index, position })
            .collect();

        Ok(Self {
            tree: RTree::bulk_load(entries),
            positions: positions.to_vec(),
        })
    }

    /// Number of indexed incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if the index holds no incidents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// For each incident, counts the other incidents within `radius`
    /// (inclusive). An incident never counts itself, but coincident
    /// duplicates count each other.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::InvalidRadius`] for non-positive or
    /// non-finite radii.
    pub fn neighbor_counts(&self, radius: f64) -> Result<Vec<u32>, DensityError> {
        validate_radius(radius)?;
        let radius_2 = radius * radius;

        let counts = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let within = self
                    .tree
                    .locate_within_distance(position, radius_2)
                    .filter(|entry| entry.index != i)
                    .count();
                u32::try_from(within).unwrap_or(u32::MAX)
            })
            .collect();

        Ok(counts)
    }
}

/// Computes the density vector for a single radius.
///
/// # Errors
///
/// Returns [`DensityError`] on invalid radius or non-finite coordinates.
pub fn compute_density(positions: &[[f64; 2]], radius: f64) -> Result<Vec<u32>, DensityError> {
    DensityIndex::new(positions)?.neighbor_counts(radius)
}

/// Distribution of densities at one candidate radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RadiusSummary {
    /// Radius in degrees.
    pub radius: f64,
    /// Approximate radius in metres.
    pub approx_meters: f64,
    /// Mean neighbour count.
    pub mean: f64,
    /// Minimum neighbour count.
    pub min: u32,
    /// Maximum neighbour count.
    pub max: u32,
}

impl RadiusSummary {
    /// Summarizes a density vector computed at `radius`.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::Empty`] if `densities` is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_densities(
        radius: f64,
        meters_per_degree: f64,
        densities: &[u32],
    ) -> Result<Self, DensityError> {
        let (Some(&min), Some(&max)) = (densities.iter().min(), densities.iter().max()) else {
            return Err(DensityError::Empty);
        };
        let total: u64 = densities.iter().map(|&d| u64::from(d)).sum();

        Ok(Self {
            radius,
            approx_meters: radius * meters_per_degree,
            mean: total as f64 / densities.len() as f64,
            min,
            max,
        })
    }
}

/// Evaluates every candidate radius and summarizes the resulting density
/// distributions, in the order given.
///
/// The index is built once and reused across radii.
///
/// # Errors
///
/// Returns [`DensityError`] on empty input, invalid radius, or non-finite
/// coordinates.
pub fn radius_sensitivity(
    positions: &[[f64; 2]],
    radii: &[f64],
    meters_per_degree: f64,
) -> Result<Vec<RadiusSummary>, DensityError> {
    if positions.is_empty() {
        return Err(DensityError::Empty);
    }
    let index = DensityIndex::new(positions)?;

    radii
        .iter()
        .map(|&radius| {
            let densities = index.neighbor_counts(radius)?;
            let summary = RadiusSummary::from_densities(radius, meters_per_degree, &densities)?;
            log::debug!(
                "Radius {:.4} (~{:.0}m): mean={:.2} min={} max={}",
                summary.radius,
                summary.approx_meters,
                summary.mean,
                summary.min,
                summary.max
            );
            Ok(summary)
        })
        .collect()
}

fn validate_radius(radius: f64) -> Result<(), DensityError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(DensityError::InvalidRadius { radius })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic scatter without pulling in an RNG.
    fn lattice(n: usize) -> Vec<[f64; 2]> {
        (0..n)
            .map(|i| {
                let i = i as f64;
                [
                    -71.066 + (i * 0.618_034).fract() * 0.008,
                    42.362 + (i * 0.414_213).fract() * 0.007,
                ]
            })
            .collect()
    }

    fn pairwise(positions: &[[f64; 2]], radius: f64) -> Vec<u32> {
        let radius_2 = radius * radius;
        positions
            .iter()
            .enumerate()
            .map(|(i, a)| {
                positions
                    .iter()
                    .enumerate()
                    .filter(|(j, b)| {
                        let dx = a[0] - b[0];
                        let dy = a[1] - b[1];
                        *j != i && dx * dx + dy * dy <= radius_2
                    })
                    .count() as u32
            })
            .collect()
    }

    #[test]
    fn matches_pairwise_definition() {
        let positions = lattice(200);
        for radius in [0.001, 0.002, 0.003, 0.004] {
            assert_eq!(
                compute_density(&positions, radius).unwrap(),
                pairwise(&positions, radius),
                "radius {radius}"
            );
        }
    }

    #[test]
    fn isolated_incident_has_zero_density() {
        let positions = [[-71.06, 42.36], [-71.05, 42.37]];
        assert_eq!(compute_density(&positions, 0.002).unwrap(), vec![0, 0]);
    }

    #[test]
    fn self_is_excluded_but_duplicates_count() {
        let positions = [[-71.06, 42.36], [-71.06, 42.36], [-71.06, 42.36]];
        assert_eq!(compute_density(&positions, 0.001).unwrap(), vec![2, 2, 2]);
    }

    #[test]
    fn boundary_distance_is_inclusive() {
        let positions = [[0.0, 0.0], [0.5, 0.0]];
        assert_eq!(compute_density(&positions, 0.5).unwrap(), vec![1, 1]);
    }

    #[test]
    fn density_is_monotone_in_radius() {
        let positions = lattice(300);
        let index = DensityIndex::new(&positions).unwrap();
        let radii = [0.001, 0.002, 0.003, 0.004];
        let densities: Vec<Vec<u32>> = radii
            .iter()
            .map(|&r| index.neighbor_counts(r).unwrap())
            .collect();

        for pair in densities.windows(2) {
            for (small, large) in pair[0].iter().zip(&pair[1]) {
                assert!(small <= large);
            }
        }
    }

    #[test]
    fn rejects_invalid_radius() {
        let positions = lattice(5);
        for radius in [0.0, -0.001, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                compute_density(&positions, radius),
                Err(DensityError::InvalidRadius { .. })
            ));
        }
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let positions = [[-71.06, 42.36], [f64::NAN, 42.36]];
        assert!(matches!(
            DensityIndex::new(&positions),
            Err(DensityError::NonFiniteCoordinate { index: 1 })
        ));
    }

    #[test]
    fn sensitivity_reports_each_radius_in_order() {
        let positions = lattice(100);
        let radii = DensityConfig::default().candidate_radii;
        let summaries = radius_sensitivity(&positions, &radii, 100_000.0).unwrap();

        assert_eq!(summaries.len(), 4);
        for (summary, radius) in summaries.iter().zip(&radii) {
            assert!((summary.radius - radius).abs() < f64::EPSILON);
            assert!(summary.min as f64 <= summary.mean);
            assert!(summary.mean <= summary.max as f64);
        }
        assert!((summaries[1].approx_meters - 200.0).abs() < 1e-9);
        assert!(summaries[0].mean <= summaries[3].mean);
    }

    #[test]
    fn sensitivity_rejects_empty_input() {
        assert!(matches!(
            radius_sensitivity(&[], &[0.002], 100_000.0),
            Err(DensityError::Empty)
        ));
    }
}
