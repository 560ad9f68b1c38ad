#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output types of the hotspot analysis.
//!
//! [`AnalyzedIncident`] is the flat per-incident row handed to renderers
//! and written to CSV; the remaining types are the aggregates that feed the
//! JSON report and the text summary.

use chrono::NaiveDateTime;
use crime_hotspot_incident_models::{
    BoundingBox, DayOfWeek, EnrichedIncident, HourBand, Season, Zone,
};
use crime_hotspot_modeling_models::{ModelKind, Partition};
use serde::{Deserialize, Serialize};

/// Hotspot classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HotspotConfig {
    /// Density quantile used as the hotspot threshold.
    pub quantile: f64,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self { quantile: 0.75 }
    }
}

/// Synthetic data generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SyntheticConfig {
    /// Box incidents are scattered over.
    pub bounds: BoundingBox,
    /// Default number of incidents to generate.
    pub count: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::NORTH_STATION,
            count: 500,
        }
    }
}

/// Predicted density and residual (`density - prediction`) of one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelEstimate {
    /// Predicted density.
    pub prediction: f64,
    /// Observed minus predicted.
    pub residual: f64,
}

impl ModelEstimate {
    #[must_use]
    pub fn new(density: f64, prediction: f64) -> Self {
        Self {
            prediction,
            residual: density - prediction,
        }
    }
}

/// One incident with every derived, density, hotspot and model column.
///
/// Flat so it serializes directly as a CSV row. Column names are stable;
/// renderers select them by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedIncident {
    /// Source incident number, when present.
    pub incident_number: Option<String>,
    /// Resolved occurrence timestamp.
    pub occurred_at: NaiveDateTime,
    /// Longitude in degrees (after any correction).
    pub longitude: f64,
    /// Latitude in degrees (after any correction).
    pub latitude: f64,
    /// Street name as reported.
    pub street: String,
    /// Offense description as reported.
    pub offense_description: String,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Month, 1-12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Whether the coordinates were synthetically placed.
    pub coordinates_corrected: bool,
    /// Street zone.
    pub zone: Zone,
    /// Weekday of the occurrence date.
    pub day_of_week: DayOfWeek,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Meteorological season of the month.
    pub season: Season,
    /// Time-of-day bucket.
    pub hour_band: HourBand,
    /// Other incidents within the operating radius.
    pub density: u32,
    /// Density at or above the hotspot threshold.
    pub is_hotspot: bool,
    /// Train or test membership.
    pub partition: Partition,
    /// kNN predicted density.
    pub knn_prediction: f64,
    /// Density minus the kNN prediction.
    pub knn_residual: f64,
    /// Linear model predicted density.
    pub linear_prediction: f64,
    /// Density minus the linear prediction.
    pub linear_residual: f64,
    /// Decision tree predicted density.
    pub decision_tree_prediction: f64,
    /// Density minus the decision tree prediction.
    pub decision_tree_residual: f64,
    /// Polynomial model predicted density.
    pub polynomial_prediction: f64,
    /// Density minus the polynomial prediction.
    pub polynomial_residual: f64,
    /// Mean of the kNN and polynomial predictions.
    pub ensemble_mean_prediction: f64,
    /// Density minus the mean ensemble prediction.
    pub ensemble_mean_residual: f64,
    /// Weighted blend of the kNN and polynomial predictions.
    pub ensemble_weighted_prediction: f64,
    /// Density minus the weighted ensemble prediction.
    pub ensemble_weighted_residual: f64,
    /// Lowest test-MSE model.
    pub best_model: ModelKind,
    /// Prediction of the best model.
    pub best_prediction: f64,
    /// Density minus the best model prediction.
    pub best_residual: f64,
}

impl AnalyzedIncident {
    /// Assembles a row. `estimate` must return the estimate for each
    /// [`ModelKind`].
    #[must_use]
    pub fn new(
        enriched: &EnrichedIncident,
        density: u32,
        is_hotspot: bool,
        partition: Partition,
        best_model: ModelKind,
        estimate: impl Fn(ModelKind) -> ModelEstimate,
    ) -> Self {
        let incident = &enriched.incident;
        let knn = estimate(ModelKind::Knn);
        let linear = estimate(ModelKind::Linear);
        let tree = estimate(ModelKind::DecisionTree);
        let polynomial = estimate(ModelKind::Polynomial);
        let mean = estimate(ModelKind::EnsembleMean);
        let weighted = estimate(ModelKind::EnsembleWeighted);
        let best = estimate(best_model);

        Self {
            incident_number: incident.incident_number.clone(),
            occurred_at: incident.occurred_at,
            longitude: incident.longitude,
            latitude: incident.latitude,
            street: incident.street.clone(),
            offense_description: incident.offense_description.clone(),
            hour: incident.hour,
            month: incident.month,
            year: incident.year,
            coordinates_corrected: incident.coordinates_corrected,
            zone: enriched.zone,
            day_of_week: enriched.features.day_of_week,
            is_weekend: enriched.features.is_weekend,
            season: enriched.features.season,
            hour_band: enriched.features.hour_band,
            density,
            is_hotspot,
            partition,
            knn_prediction: knn.prediction,
            knn_residual: knn.residual,
            linear_prediction: linear.prediction,
            linear_residual: linear.residual,
            decision_tree_prediction: tree.prediction,
            decision_tree_residual: tree.residual,
            polynomial_prediction: polynomial.prediction,
            polynomial_residual: polynomial.residual,
            ensemble_mean_prediction: mean.prediction,
            ensemble_mean_residual: mean.residual,
            ensemble_weighted_prediction: weighted.prediction,
            ensemble_weighted_residual: weighted.residual,
            best_model,
            best_prediction: best.prediction,
            best_residual: best.residual,
        }
    }

    /// Prediction and residual columns for one model.
    #[must_use]
    pub const fn estimate(&self, model: ModelKind) -> ModelEstimate {
        let (prediction, residual) = match model {
            ModelKind::Knn => (self.knn_prediction, self.knn_residual),
            ModelKind::Linear => (self.linear_prediction, self.linear_residual),
            ModelKind::DecisionTree => (self.decision_tree_prediction, self.decision_tree_residual),
            ModelKind::Polynomial => (self.polynomial_prediction, self.polynomial_residual),
            ModelKind::EnsembleMean => (self.ensemble_mean_prediction, self.ensemble_mean_residual),
            ModelKind::EnsembleWeighted => (
                self.ensemble_weighted_prediction,
                self.ensemble_weighted_residual,
            ),
        };
        ModelEstimate {
            prediction,
            residual,
        }
    }
}

/// Threshold and count of the hotspot classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HotspotSummary {
    /// Quantile used.
    pub quantile: f64,
    /// Density at that quantile.
    pub threshold: f64,
    /// Incidents at or above the threshold.
    pub hotspots: usize,
    /// Incidents classified.
    pub total: usize,
}

impl HotspotSummary {
    /// Share of incidents flagged, 0 when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hotspots as f64 / self.total as f64
        }
    }
}

/// Incident count for one category value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryCount {
    /// Category label.
    pub label: String,
    /// Incidents in that category.
    pub count: usize,
}

/// When incidents happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TemporalPatterns {
    /// Counts per hour band, in band order.
    pub by_hour_band: Vec<CategoryCount>,
    /// Counts per weekday, Monday first.
    pub by_day_of_week: Vec<CategoryCount>,
    /// Counts per season.
    pub by_season: Vec<CategoryCount>,
    /// Counts per year, ascending.
    pub by_year: Vec<CategoryCount>,
    /// Hour of day with the most incidents (earliest on ties).
    pub peak_hour: Option<u32>,
    /// Share of incidents on Saturday or Sunday.
    pub weekend_share: f64,
}

/// Per-zone incident and density figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ZoneStats {
    /// Street zone.
    pub zone: Zone,
    /// Incidents in the zone.
    pub incidents: usize,
    /// Hotspot incidents in the zone.
    pub hotspots: usize,
    /// Mean density over the zone's incidents.
    pub mean_density: f64,
}

/// Where incidents happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpatialPatterns {
    /// One entry per zone that has incidents, in zone order.
    pub zones: Vec<ZoneStats>,
    /// Incidents whose coordinates were synthesized.
    pub corrected_coordinates: usize,
}
