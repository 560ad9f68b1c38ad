//! Fixed-structure plain-text summary of a run.

use std::fmt::Write as _;

use crime_hotspot_analytics_models::CategoryCount;

use crate::pipeline::AnalysisReport;

/// Section headings, in output order.
pub const SECTIONS: &[&str] = &[
    "TEMPORAL PATTERNS",
    "SPATIAL PATTERNS",
    "MODELING EFFECTIVENESS",
    "HOTSPOTS",
    "RECOMMENDATIONS",
    "LIMITATIONS",
];

fn busiest(counts: &[CategoryCount]) -> Option<&CategoryCount> {
    counts
        .iter()
        .filter(|c| c.count > 0)
        .fold(None, |best: Option<&CategoryCount>, c| match best {
            Some(b) if b.count >= c.count => Some(b),
            _ => Some(c),
        })
}

fn heading(out: &mut String, index: usize) {
    let title = SECTIONS[index];
    let _ = writeln!(out, "\n{}. {title}\n{}", index + 1, "-".repeat(title.len() + 3));
}

/// Renders the summary. Content is templated from the report; the section
/// layout never changes.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let total = report.hotspots.total;

    let _ = writeln!(out, "ASSAULT HOTSPOT ANALYSIS");
    let _ = writeln!(out, "========================");
    let _ = writeln!(out, "Incidents analyzed: {total}");
    let _ = writeln!(out, "Seed: {}", report.seed);

    heading(&mut out, 0);
    if let Some(band) = busiest(&report.temporal.by_hour_band) {
        let _ = writeln!(
            out,
            "Busiest time of day: {} ({} incidents)",
            band.label, band.count
        );
    }
    if let Some(hour) = report.temporal.peak_hour {
        let _ = writeln!(out, "Peak hour: {hour:02}:00");
    }
    if let Some(day) = busiest(&report.temporal.by_day_of_week) {
        let _ = writeln!(out, "Busiest day: {} ({} incidents)", day.label, day.count);
    }
    let _ = writeln!(
        out,
        "Weekend share: {:.1}%",
        report.temporal.weekend_share * 100.0
    );
    for season in &report.temporal.by_season {
        let _ = writeln!(out, "  {:<8} {}", season.label, season.count);
    }
    for year in &report.temporal.by_year {
        let _ = writeln!(out, "  {:<8} {}", year.label, year.count);
    }

    heading(&mut out, 1);
    for zone in &report.spatial.zones {
        let _ = writeln!(
            out,
            "  {:<10} {:>5} incidents, {:>5} hotspots, mean density {:.2}",
            zone.zone.as_ref(),
            zone.incidents,
            zone.hotspots,
            zone.mean_density
        );
    }
    let _ = writeln!(
        out,
        "Operating radius: {} deg (~{:.0} m), mean density {:.2} (min {}, max {})",
        report.density.radius,
        report.density.approx_meters,
        report.density.mean,
        report.density.min,
        report.density.max
    );
    for radius in &report.radius_sensitivity {
        let _ = writeln!(
            out,
            "  r={:.3} (~{:.0} m): mean {:.2}, min {}, max {}",
            radius.radius, radius.approx_meters, radius.mean, radius.min, radius.max
        );
    }
    if report.spatial.corrected_coordinates > 0 {
        let _ = writeln!(
            out,
            "Coordinates synthesized for {} incidents",
            report.spatial.corrected_coordinates
        );
    }

    heading(&mut out, 2);
    for (rank, result) in report.ranking.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<20} MSE {:>10.4}  RMSE {:>8.4}",
            rank + 1,
            result.model.label(),
            result.mse,
            result.rmse
        );
    }
    let cv = &report.cross_validation;
    let _ = writeln!(
        out,
        "kNN {}-fold cross-validation: mean MSE {:.4} (std {:.4})",
        cv.fold_mse.len(),
        cv.mean_mse,
        cv.std_mse
    );
    let _ = writeln!(out, "Best model: {}", report.best_model.label());

    heading(&mut out, 3);
    let _ = writeln!(
        out,
        "{} of {} incidents ({:.1}%) at or above the {:.0}th percentile density of {:.2}",
        report.hotspots.hotspots,
        total,
        report.hotspots.share() * 100.0,
        report.hotspots.quantile * 100.0,
        report.hotspots.threshold
    );

    heading(&mut out, 4);
    if let Some(zone) = report.spatial.zones.iter().max_by_key(|z| z.hotspots) {
        let _ = writeln!(
            out,
            "- Concentrate patrols on {} where {} hotspot incidents cluster.",
            zone.zone.as_ref(),
            zone.hotspots
        );
    }
    if let Some(band) = busiest(&report.temporal.by_hour_band) {
        let _ = writeln!(out, "- Schedule coverage for the {} period.", band.label);
    }
    let _ = writeln!(
        out,
        "- Use the {} predictions to prioritize locations with positive residuals.",
        report.best_model.label()
    );

    heading(&mut out, 5);
    let _ = writeln!(
        out,
        "- Density is a neighbour count in coordinate degrees, not geodesic distance."
    );
    let _ = writeln!(
        out,
        "- Models see only location and hour; no demographic or event data."
    );
    if let Some(normalization) = &report.normalization {
        if normalization.corrected_coordinates > 0 {
            let _ = writeln!(
                out,
                "- {} incidents have synthesized coordinates.",
                normalization.corrected_coordinates
            );
        }
        let invented = normalization.coarse_dates + normalization.sequential_dates;
        if invented > 0 {
            let _ = writeln!(
                out,
                "- {invented} incidents have reconstructed occurrence dates."
            );
        }
    }
    let _ = writeln!(
        out,
        "- Results depend on a single seeded train/test split."
    );

    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crime_hotspot_incident_models::BoundingBox;
    use crime_hotspot_source::progress::{NullProgress, ProgressCallback};
    use crime_hotspot_source::synthetic::scatter_incidents;

    use super::*;
    use crate::{AnalysisConfig, analyze_records};

    #[test]
    fn summary_has_every_section_in_order() {
        let records = scatter_incidents(120, &BoundingBox::NORTH_STATION, 4).unwrap();
        let progress: Arc<dyn ProgressCallback> = Arc::new(NullProgress);
        let analysis =
            analyze_records(&records, &AnalysisConfig::default(), 4, &progress).unwrap();
        let text = render(&analysis.report);

        let mut last = 0;
        for section in SECTIONS {
            let at = text.find(section).unwrap();
            assert!(at >= last, "{section} out of order");
            last = at;
        }
        assert!(text.contains(analysis.report.best_model.label()));
        assert!(text.contains("Incidents analyzed: 120"));
    }
}
