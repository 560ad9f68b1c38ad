//! Writers for the analyzed table, JSON report, hotspot layer and summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crime_hotspot_analytics_models::AnalyzedIncident;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::AnalyticsError;
use crate::pipeline::{Analysis, AnalysisReport};
use crate::summary;

pub const INCIDENTS_FILE: &str = "incidents.csv";
pub const REPORT_FILE: &str = "report.json";
pub const HOTSPOTS_FILE: &str = "hotspots.geojson";
pub const SUMMARY_FILE: &str = "summary.txt";

/// Writes one CSV row per analyzed incident, with a header.
///
/// # Errors
///
/// Returns [`AnalyticsError::Csv`] if serialization or writing fails.
pub fn write_incidents_to<W: Write>(
    writer: W,
    rows: &[AnalyzedIncident],
) -> Result<(), AnalyticsError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the report as pretty JSON.
///
/// # Errors
///
/// Returns [`AnalyticsError::Json`] if serialization or writing fails.
pub fn write_report_to<W: Write>(writer: W, report: &AnalysisReport) -> Result<(), AnalyticsError> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Point features for every hotspot incident.
#[must_use]
pub fn hotspot_features(rows: &[AnalyzedIncident]) -> FeatureCollection {
    let features = rows
        .iter()
        .filter(|row| row.is_hotspot)
        .map(|row| {
            let mut properties = JsonObject::new();
            properties.insert("incident_number".to_string(), json!(row.incident_number));
            properties.insert("occurred_at".to_string(), json!(row.occurred_at.to_string()));
            properties.insert("street".to_string(), json!(row.street));
            properties.insert("zone".to_string(), json!(row.zone.as_ref()));
            properties.insert("hour_band".to_string(), json!(row.hour_band.as_ref()));
            properties.insert("density".to_string(), json!(row.density));
            properties.insert("best_model".to_string(), json!(row.best_model.as_ref()));
            properties.insert("best_prediction".to_string(), json!(row.best_prediction));
            properties.insert("best_residual".to_string(), json!(row.best_residual));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    row.longitude,
                    row.latitude,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, AnalyticsError> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Writes the table, report, hotspot layer and summary into `dir`,
/// creating it if needed. Returns the written paths.
///
/// # Errors
///
/// Returns [`AnalyticsError`] on any I/O or serialization failure.
pub fn write_all(dir: &Path, analysis: &Analysis) -> Result<Vec<PathBuf>, AnalyticsError> {
    std::fs::create_dir_all(dir)?;

    let incidents = dir.join(INCIDENTS_FILE);
    write_incidents_to(create(&incidents)?, &analysis.incidents)?;

    let report = dir.join(REPORT_FILE);
    let mut writer = create(&report)?;
    write_report_to(&mut writer, &analysis.report)?;
    writer.flush()?;

    let hotspots = dir.join(HOTSPOTS_FILE);
    let mut writer = create(&hotspots)?;
    serde_json::to_writer(&mut writer, &hotspot_features(&analysis.incidents))?;
    writer.flush()?;

    let summary_path = dir.join(SUMMARY_FILE);
    std::fs::write(&summary_path, summary::render(&analysis.report))?;

    let written = vec![incidents, report, hotspots, summary_path];
    for path in &written {
        log::info!("Wrote {}", path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use crime_hotspot_incident_models::BoundingBox;
    use crime_hotspot_source::progress::null_progress;
    use crime_hotspot_source::synthetic::scatter_incidents;

    use super::*;
    use crate::{AnalysisConfig, analyze_records};

    fn analysis() -> Analysis {
        let records = scatter_incidents(80, &BoundingBox::NORTH_STATION, 8).unwrap();
        analyze_records(&records, &AnalysisConfig::default(), 8, &null_progress()).unwrap()
    }

    #[test]
    fn csv_has_a_header_and_one_line_per_incident() {
        let analysis = analysis();
        let mut buf = Vec::new();
        write_incidents_to(&mut buf, &analysis.incidents).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        for column in [
            "zone",
            "season",
            "hour_band",
            "density",
            "is_hotspot",
            "partition",
            "knn_prediction",
            "ensemble_weighted_residual",
            "best_model",
        ] {
            assert!(header.split(',').any(|h| h == column), "missing {column}");
        }
        assert_eq!(lines.count(), 80);
    }

    #[test]
    fn geojson_holds_only_hotspots() {
        let analysis = analysis();
        let collection = hotspot_features(&analysis.incidents);
        assert_eq!(
            collection.features.len(),
            analysis.report.hotspots.hotspots
        );
        let rendered = serde_json::to_string(&collection).unwrap();
        assert!(rendered.contains("\"FeatureCollection\""));
    }

    #[test]
    fn report_json_names_the_best_model() {
        let analysis = analysis();
        let mut buf = Vec::new();
        write_report_to(&mut buf, &analysis.report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            value["best_model"],
            json!(analysis.report.best_model.as_ref())
        );
        assert_eq!(value["ranking"].as_array().unwrap().len(), 6);
    }
}
