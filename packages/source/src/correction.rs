//! Synthetic coordinate correction.
//!
//! Rows whose coordinates fall outside the valid bounding box are moved to
//! a fixed anchor for their street zone, plus a small seeded uniform
//! jitter so corrected incidents do not all collapse onto one point.

use crime_hotspot_incident_models::{BoundingBox, Zone};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Which rows are re-placed when invalid coordinates are found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionPolicy {
    /// Only rows outside the bounding box.
    #[default]
    InvalidOnly,
    /// Every row, as soon as any single row is outside the bounding box.
    AllWhenAnyInvalid,
}

/// `[longitude, latitude]` anchor per zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ZoneAnchors {
    /// Causeway Street anchor.
    pub causeway: [f64; 2],
    /// Canal Street anchor.
    pub canal: [f64; 2],
    /// Nashua Street anchor.
    pub nashua: [f64; 2],
    /// Fallback anchor for any other street.
    pub other: [f64; 2],
}

impl Default for ZoneAnchors {
    fn default() -> Self {
        Self {
            causeway: [-71.0606, 42.3662],
            canal: [-71.0595, 42.3638],
            nashua: [-71.0653, 42.3672],
            other: [-71.0620, 42.3655],
        }
    }
}

impl ZoneAnchors {
    /// Anchor for a zone.
    #[must_use]
    pub const fn anchor(&self, zone: Zone) -> [f64; 2] {
        match zone {
            Zone::Causeway => self.causeway,
            Zone::Canal => self.canal,
            Zone::Nashua => self.nashua,
            Zone::Other => self.other,
        }
    }
}

/// Coordinate validation and correction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CorrectionConfig {
    /// Which rows to re-place.
    pub policy: CorrectionPolicy,
    /// Half-width of the uniform jitter, in degrees.
    pub jitter_degrees: f64,
    /// Per-zone anchors.
    pub anchors: ZoneAnchors,
    /// Coordinates outside this box are invalid.
    pub valid_bounds: BoundingBox,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            policy: CorrectionPolicy::default(),
            jitter_degrees: 0.0005,
            anchors: ZoneAnchors::default(),
            valid_bounds: BoundingBox::BOSTON,
        }
    }
}

impl CorrectionConfig {
    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] for a negative or non-finite jitter,
    /// or an anchor outside the valid bounds.
    pub fn validate(&self) -> Result<(), SourceError> {
        if !self.jitter_degrees.is_finite() || self.jitter_degrees < 0.0 {
            return Err(SourceError::Config {
                message: format!(
                    "jitter_degrees must be a non-negative number, got {}",
                    self.jitter_degrees
                ),
            });
        }
        for zone in Zone::all() {
            let [lon, lat] = self.anchors.anchor(*zone);
            if !self.valid_bounds.contains(lon, lat) {
                return Err(SourceError::Config {
                    message: format!("{zone} anchor ({lon}, {lat}) is outside the valid bounds"),
                });
            }
        }
        Ok(())
    }
}

/// Final coordinates for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// `[longitude, latitude]`.
    pub position: [f64; 2],
    /// Whether the position was synthesized.
    pub corrected: bool,
}

/// Validates every position and re-places rows according to the policy.
///
/// Positions must be finite; rows with missing coordinates are dropped
/// before this step. Output order matches input order, and the jitter
/// sequence depends only on `seed` and the rows being corrected.
#[must_use]
pub fn correct_coordinates(
    rows: &[(Zone, [f64; 2])],
    config: &CorrectionConfig,
    seed: u64,
) -> Vec<Placement> {
    let invalid: Vec<bool> = rows
        .iter()
        .map(|(_, [lon, lat])| !config.valid_bounds.contains(*lon, *lat))
        .collect();
    let invalid_count = invalid.iter().filter(|&&b| b).count();

    if invalid_count == 0 {
        return rows
            .iter()
            .map(|(_, position)| Placement {
                position: *position,
                corrected: false,
            })
            .collect();
    }

    let correct_all = config.policy == CorrectionPolicy::AllWhenAnyInvalid;
    if correct_all {
        log::warn!(
            "{invalid_count} of {} rows have coordinates outside the valid bounds; \
             re-placing ALL rows at zone anchors",
            rows.len()
        );
    } else {
        log::warn!(
            "{invalid_count} of {} rows have coordinates outside the valid bounds; \
             re-placing them at zone anchors",
            rows.len()
        );
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = config.jitter_degrees;

    rows.iter()
        .zip(&invalid)
        .map(|((zone, position), &is_invalid)| {
            if !(is_invalid || correct_all) {
                return Placement {
                    position: *position,
                    corrected: false,
                };
            }
            let [lon, lat] = config.anchors.anchor(*zone);
            Placement {
                position: [
                    lon + rng.random_range(-jitter..=jitter),
                    lat + rng.random_range(-jitter..=jitter),
                ],
                corrected: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<(Zone, [f64; 2])> {
        vec![
            (Zone::Causeway, [-71.0610, 42.3660]),
            (Zone::Canal, [0.0, 0.0]),
            (Zone::Nashua, [-71.0650, 42.3670]),
            (Zone::Other, [-1.0, -1.0]),
        ]
    }

    #[test]
    fn valid_rows_pass_through_untouched() {
        let input = vec![(Zone::Causeway, [-71.0610, 42.3660])];
        let out = correct_coordinates(&input, &CorrectionConfig::default(), 7);
        assert_eq!(
            out,
            vec![Placement {
                position: [-71.0610, 42.3660],
                corrected: false
            }]
        );
    }

    #[test]
    fn invalid_only_policy_moves_just_the_invalid_rows_near_their_anchor() {
        let config = CorrectionConfig::default();
        let out = correct_coordinates(&rows(), &config, 7);

        assert!(!out[0].corrected);
        assert_eq!(out[0].position, [-71.0610, 42.3660]);
        assert!(out[1].corrected);
        assert!(!out[2].corrected);
        assert!(out[3].corrected);

        let [alon, alat] = config.anchors.canal;
        assert!((out[1].position[0] - alon).abs() <= config.jitter_degrees);
        assert!((out[1].position[1] - alat).abs() <= config.jitter_degrees);
        assert!(config.valid_bounds.contains(out[3].position[0], out[3].position[1]));
    }

    #[test]
    fn all_when_any_invalid_moves_every_row() {
        let config = CorrectionConfig {
            policy: CorrectionPolicy::AllWhenAnyInvalid,
            ..CorrectionConfig::default()
        };
        let out = correct_coordinates(&rows(), &config, 7);
        assert!(out.iter().all(|p| p.corrected));
    }

    #[test]
    fn jitter_is_reproducible_for_a_seed() {
        let config = CorrectionConfig::default();
        assert_eq!(
            correct_coordinates(&rows(), &config, 11),
            correct_coordinates(&rows(), &config, 11)
        );
        assert_ne!(
            correct_coordinates(&rows(), &config, 11),
            correct_coordinates(&rows(), &config, 12)
        );
    }

    #[test]
    fn zero_jitter_places_exactly_on_anchor() {
        let config = CorrectionConfig {
            jitter_degrees: 0.0,
            ..CorrectionConfig::default()
        };
        let out = correct_coordinates(&rows(), &config, 1);
        assert_eq!(out[3].position, config.anchors.other);
    }

    #[test]
    fn rejects_negative_jitter() {
        let config = CorrectionConfig {
            jitter_degrees: -0.1,
            ..CorrectionConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(CorrectionConfig::default().validate().is_ok());
    }
}
