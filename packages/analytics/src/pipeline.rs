//! End-to-end analysis: normalize, enrich, densify, model, classify.
//!
//! Every stage consumes the previous stage's output by reference and
//! returns a new value; nothing is mutated after it is produced.

use std::sync::Arc;

use crime_hotspot_analytics_models::{
    AnalyzedIncident, HotspotSummary, ModelEstimate, SpatialPatterns, TemporalPatterns,
};
use crime_hotspot_features::enrich_all;
use crime_hotspot_incident_models::{EnrichedIncident, Incident};
use crime_hotspot_modeling::{ModelComparison, compare_models};
use crime_hotspot_modeling_models::{
    CrossValidationReport, EvaluationResult, ModelKind, Observation,
};
use crime_hotspot_source::progress::ProgressCallback;
use crime_hotspot_source::{NormalizeReport, RawRecord, normalize};
use crime_hotspot_spatial::{RadiusSummary, compute_density, radius_sensitivity};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::{AnalyticsError, hotspot, patterns};

/// Stages reported through [`ProgressCallback`].
const STAGES: &[&str] = &[
    "Deriving features",
    "Computing density",
    "Evaluating models",
    "Classifying hotspots",
    "Aggregating patterns",
];

/// Machine-readable run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisReport {
    /// Seed that drove every random choice.
    pub seed: u64,
    /// Row accounting, when the run started from raw rows.
    pub normalization: Option<NormalizeReport>,
    /// Density distribution at every candidate radius.
    pub radius_sensitivity: Vec<RadiusSummary>,
    /// Density distribution at the operating radius.
    pub density: RadiusSummary,
    /// kNN cross-validation on the training partition.
    pub cross_validation: CrossValidationReport,
    /// Test-set errors, best first.
    pub ranking: Vec<EvaluationResult>,
    /// Rank-1 model.
    pub best_model: ModelKind,
    /// Hotspot threshold and count.
    pub hotspots: HotspotSummary,
    /// When incidents happen.
    pub temporal: TemporalPatterns,
    /// Where incidents happen.
    pub spatial: SpatialPatterns,
}

/// Output of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// One row per incident, in input order.
    pub incidents: Vec<AnalyzedIncident>,
    /// Aggregates and model results.
    pub report: AnalysisReport,
    /// Full model comparison, including every prediction vector.
    pub comparison: ModelComparison,
}

/// Normalizes raw rows, then runs [`analyze`].
///
/// # Errors
///
/// Returns [`AnalyticsError::NoIncidents`] if nothing survives filtering,
/// and propagates any stage failure.
pub fn analyze_records(
    records: &[RawRecord],
    config: &AnalysisConfig,
    seed: u64,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Analysis, AnalyticsError> {
    let normalized = normalize(records, &config.filter, &config.correction, seed)?;
    if normalized.incidents.is_empty() {
        return Err(AnalyticsError::NoIncidents {
            raw_rows: normalized.report.raw_rows,
        });
    }
    let mut analysis = analyze(&normalized.incidents, config, seed, progress)?;
    analysis.report.normalization = Some(normalized.report);
    Ok(analysis)
}

/// Runs every analysis stage over already-normalized incidents.
///
/// # Errors
///
/// Returns [`AnalyticsError::NoIncidents`] for empty input, and propagates
/// density, model, and hotspot failures.
pub fn analyze(
    incidents: &[Incident],
    config: &AnalysisConfig,
    seed: u64,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Analysis, AnalyticsError> {
    if incidents.is_empty() {
        return Err(AnalyticsError::NoIncidents { raw_rows: 0 });
    }
    config.validate()?;
    progress.set_total(STAGES.len() as u64);
    log::info!("Analyzing {} incidents (seed {seed})", incidents.len());

    progress.set_message(STAGES[0].to_string());
    let enriched = enrich_all(incidents);
    progress.inc(1);

    progress.set_message(STAGES[1].to_string());
    let positions: Vec<[f64; 2]> = incidents
        .iter()
        .map(|i| [i.longitude, i.latitude])
        .collect();
    let sensitivity = radius_sensitivity(
        &positions,
        &config.density.candidate_radii,
        config.density.meters_per_degree,
    )?;
    let densities = compute_density(&positions, config.density.radius)?;
    let density = RadiusSummary::from_densities(
        config.density.radius,
        config.density.meters_per_degree,
        &densities,
    )?;
    log::info!(
        "Operating radius {} (~{:.0}m): mean density {:.2} (min {}, max {})",
        density.radius,
        density.approx_meters,
        density.mean,
        density.min,
        density.max
    );
    progress.inc(1);

    progress.set_message(STAGES[2].to_string());
    let observations = observations(incidents, &densities);
    let comparison = compare_models(&observations, &config.model, seed)?;
    progress.inc(1);

    progress.set_message(STAGES[3].to_string());
    let (flags, hotspots) = hotspot::classify(&densities, config.hotspot.quantile)?;
    progress.inc(1);

    progress.set_message(STAGES[4].to_string());
    let temporal = patterns::temporal_patterns(&enriched);
    let spatial = patterns::spatial_patterns(&enriched, &densities, &flags);
    let rows = analyzed_rows(&enriched, &densities, &flags, &comparison);
    progress.inc(1);

    progress.finish(format!(
        "Best model: {} ({} hotspots)",
        comparison.best.model.label(),
        hotspots.hotspots
    ));

    let report = AnalysisReport {
        seed,
        normalization: None,
        radius_sensitivity: sensitivity,
        density,
        cross_validation: comparison.cross_validation.clone(),
        ranking: comparison.ranking.clone(),
        best_model: comparison.best.model,
        hotspots,
        temporal,
        spatial,
    };

    Ok(Analysis {
        incidents: rows,
        report,
        comparison,
    })
}

/// Model inputs, aligned with `incidents`.
fn observations(incidents: &[Incident], densities: &[u32]) -> Vec<Observation> {
    incidents
        .iter()
        .zip(densities)
        .map(|(incident, &density)| Observation {
            longitude: incident.longitude,
            latitude: incident.latitude,
            hour: f64::from(incident.hour),
            density: f64::from(density),
        })
        .collect()
}

fn analyzed_rows(
    enriched: &[EnrichedIncident],
    densities: &[u32],
    flags: &[bool],
    comparison: &ModelComparison,
) -> Vec<AnalyzedIncident> {
    let partitions = comparison.partitions(enriched.len());

    enriched
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let density = densities[i];
            AnalyzedIncident::new(
                row,
                density,
                flags[i],
                partitions[i],
                comparison.best.model,
                |kind| {
                    let prediction = comparison
                        .predictions_for(kind)
                        .and_then(|values| values.get(i))
                        .copied()
                        .unwrap_or(f64::NAN);
                    ModelEstimate::new(f64::from(density), prediction)
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crime_hotspot_incident_models::BoundingBox;
    use crime_hotspot_modeling_models::Partition;
    use crime_hotspot_source::progress::null_progress;
    use crime_hotspot_source::synthetic::scatter_incidents;

    use super::*;

    fn synthetic_run(seed: u64) -> Analysis {
        let records = scatter_incidents(500, &BoundingBox::NORTH_STATION, seed).unwrap();
        analyze_records(&records, &AnalysisConfig::default(), seed, &null_progress()).unwrap()
    }

    #[test]
    fn synthetic_run_is_reproducible() {
        let a = synthetic_run(2024);
        let b = synthetic_run(2024);

        assert_eq!(a.incidents.len(), 500);
        assert!((a.report.density.mean - b.report.density.mean).abs() < 1e-12);
        assert_eq!(a.report.ranking, b.report.ranking);
        assert_eq!(a.report.cross_validation, b.report.cross_validation);

        let knn_a = a.report.ranking.iter().find(|r| r.model == ModelKind::Knn).unwrap();
        let knn_b = b.report.ranking.iter().find(|r| r.model == ModelKind::Knn).unwrap();
        assert!((knn_a.mse - knn_b.mse).abs() < 1e-12);
    }

    #[test]
    fn synthetic_run_ranks_every_model_by_its_computed_error() {
        let analysis = synthetic_run(11);
        let ranking = &analysis.report.ranking;
        assert_eq!(ranking.len(), ModelKind::all().len());

        let mut expected = analysis.comparison.results.clone();
        expected.sort_by(|a, b| a.mse.total_cmp(&b.mse));
        let expected: Vec<ModelKind> = expected.iter().map(|r| r.model).collect();
        let actual: Vec<ModelKind> = ranking.iter().map(|r| r.model).collect();
        assert_eq!(actual, expected);
        assert_eq!(analysis.report.best_model, actual[0]);

        // A uniform scatter has no spatial signal beyond local density,
        // which kNN tracks better than a global plane.
        let mse = |kind| ranking.iter().find(|r| r.model == kind).unwrap().mse;
        assert!(mse(ModelKind::Knn) < mse(ModelKind::Linear));
    }

    #[test]
    fn synthetic_run_flags_about_a_quarter_as_hotspots() {
        let analysis = synthetic_run(5);
        let summary = analysis.report.hotspots;
        assert_eq!(summary.total, 500);
        assert!(summary.share() >= 0.25);
        assert!(summary.share() < 0.40, "share {}", summary.share());

        for row in &analysis.incidents {
            assert_eq!(row.is_hotspot, f64::from(row.density) >= summary.threshold);
        }
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn rows_carry_best_model_columns_and_partitions() {
        let analysis = synthetic_run(3);
        let best = analysis.report.best_model;
        let tests = analysis
            .incidents
            .iter()
            .filter(|r| r.partition == Partition::Test)
            .count();
        assert_eq!(tests, 100);

        for row in &analysis.incidents {
            assert_eq!(row.best_model, best);
            assert_eq!(row.best_prediction, row.estimate(best).prediction);
            assert_eq!(
                row.knn_residual,
                f64::from(row.density) - row.knn_prediction
            );
            assert!(row.best_prediction.is_finite());
        }
        let normalization = analysis.report.normalization.as_ref().unwrap();
        assert_eq!(normalization.incidents, 500);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            analyze(&[], &AnalysisConfig::default(), 1, &null_progress()),
            Err(AnalyticsError::NoIncidents { .. })
        ));
    }
}
