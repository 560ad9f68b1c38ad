//! Seeded synthetic incident generation.
//!
//! Produces raw rows in the Boston export shape, uniformly scattered over
//! a bounding box, for demos and end-to-end tests.

use chrono::{Duration, NaiveDate};
use crime_hotspot_incident_models::BoundingBox;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::SourceError;
use crate::csv_file::RawRecord;

const STREETS: &[&str] = &["CAUSEWAY ST", "CANAL ST", "NASHUA ST"];
const OFFENSES: &[&str] = &["ASSAULT - SIMPLE", "ASSAULT - AGGRAVATED"];

/// Generates `count` synthetic assault rows inside `bounds`, dated
/// uniformly over 2019-2022.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if `bounds` is empty or inverted.
pub fn scatter_incidents(
    count: usize,
    bounds: &BoundingBox,
    seed: u64,
) -> Result<Vec<RawRecord>, SourceError> {
    if !(bounds.min_longitude < bounds.max_longitude && bounds.min_latitude < bounds.max_latitude)
    {
        return Err(SourceError::Config {
            message: format!("synthetic bounds are empty: {bounds:?}"),
        });
    }
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(2019, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        NaiveDate::from_ymd_opt(2023, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
    ) else {
        return Err(SourceError::Config {
            message: "invalid synthetic date range".to_string(),
        });
    };
    let span_minutes = (end - start).num_minutes();

    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..count)
        .map(|i| {
            let longitude = rng.random_range(bounds.min_longitude..bounds.max_longitude);
            let latitude = rng.random_range(bounds.min_latitude..bounds.max_latitude);
            let occurred = start + Duration::minutes(rng.random_range(0..span_minutes));
            let street = STREETS.choose(&mut rng).copied().unwrap_or(STREETS[0]);
            let offense = OFFENSES.choose(&mut rng).copied().unwrap_or(OFFENSES[0]);

            RawRecord {
                incident_number: Some(format!("S{i:06}")),
                occurred_on_date: Some(occurred.format("%Y-%m-%d %H:%M:%S").to_string()),
                offense_description: Some(offense.to_string()),
                street: Some(street.to_string()),
                lat: Some(latitude.to_string()),
                long: Some(longitude.to_string()),
                hour: Some(occurred.format("%-H").to_string()),
                month: Some(occurred.format("%-m").to_string()),
                year: Some(occurred.format("%Y").to_string()),
            }
        })
        .collect();

    log::info!("Generated {count} synthetic incidents (seed {seed})");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::{CorrectionConfig, FilterConfig};

    #[test]
    fn synthetic_rows_survive_normalization_inside_bounds() {
        let bounds = BoundingBox::NORTH_STATION;
        let records = scatter_incidents(200, &bounds, 3).unwrap();
        let out = normalize(
            &records,
            &FilterConfig::default(),
            &CorrectionConfig::default(),
            3,
        )
        .unwrap();

        assert_eq!(out.incidents.len(), 200);
        assert_eq!(out.report.corrected_coordinates, 0);
        for incident in &out.incidents {
            assert!(bounds.contains(incident.longitude, incident.latitude));
            assert!((2019..=2022).contains(&incident.year));
            assert!(incident.hour <= 23);
        }
    }

    #[test]
    fn same_seed_same_rows() {
        let bounds = BoundingBox::NORTH_STATION;
        assert_eq!(
            scatter_incidents(50, &bounds, 9).unwrap(),
            scatter_incidents(50, &bounds, 9).unwrap()
        );
    }

    #[test]
    fn rejects_inverted_bounds() {
        let bounds = BoundingBox {
            min_longitude: -71.0,
            max_longitude: -72.0,
            ..BoundingBox::NORTH_STATION
        };
        assert!(scatter_incidents(1, &bounds, 0).is_err());
    }
}
