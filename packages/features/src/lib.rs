#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Temporal feature derivation for assault incidents.
//!
//! Every function here is a pure per-incident mapping: the labels for one
//! incident never depend on any other incident.

use chrono::Datelike;
use crime_hotspot_incident_models::{
    DayOfWeek, EnrichedIncident, HourBand, Incident, IncidentFeatures, Season,
};

/// Derives the day-of-week, weekend, season, and hour-band labels for one
/// incident.
#[must_use]
pub fn derive_features(incident: &Incident) -> IncidentFeatures {
    let day_of_week = DayOfWeek::from(incident.occurred_at.weekday());

    IncidentFeatures {
        day_of_week,
        is_weekend: day_of_week.is_weekend(),
        season: Season::from_month(incident.month),
        hour_band: HourBand::from_hour(incident.hour),
    }
}

/// Attaches zone and temporal features to a copy of the incident.
#[must_use]
pub fn enrich(incident: &Incident) -> EnrichedIncident {
    EnrichedIncident {
        zone: incident.zone(),
        features: derive_features(incident),
        incident: incident.clone(),
    }
}

/// Enriches every incident, preserving order.
#[must_use]
pub fn enrich_all(incidents: &[Incident]) -> Vec<EnrichedIncident> {
    let enriched: Vec<EnrichedIncident> = incidents.iter().map(enrich).collect();

    let unknown_seasons = enriched
        .iter()
        .filter(|e| e.features.season == Season::Unknown)
        .count();
    if unknown_seasons > 0 {
        log::warn!("{unknown_seasons} incident(s) have a month outside 1-12 (season Unknown)");
    }

    let unknown_bands = enriched
        .iter()
        .filter(|e| e.features.hour_band == HourBand::Unknown)
        .count();
    if unknown_bands > 0 {
        log::warn!("{unknown_bands} incident(s) have an hour outside 0-24 (hour band Unknown)");
    }

    log::debug!("Derived features for {} incidents", enriched.len());
    enriched
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_hotspot_incident_models::Zone;

    use super::*;

    fn incident_on(year: i32, month: u32, day: u32, hour: u32) -> Incident {
        Incident {
            incident_number: None,
            occurred_at: NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            longitude: -71.0620,
            latitude: 42.3655,
            street: "CAUSEWAY ST".to_string(),
            offense_description: "ASSAULT - SIMPLE".to_string(),
            hour,
            month,
            year,
            coordinates_corrected: false,
        }
    }

    #[test]
    fn weekend_flag_matches_weekday_for_a_full_week() {
        // 2021-03-01 was a Monday.
        let expected = [
            (DayOfWeek::Monday, false),
            (DayOfWeek::Tuesday, false),
            (DayOfWeek::Wednesday, false),
            (DayOfWeek::Thursday, false),
            (DayOfWeek::Friday, false),
            (DayOfWeek::Saturday, true),
            (DayOfWeek::Sunday, true),
        ];
        for (offset, (day, weekend)) in expected.into_iter().enumerate() {
            let features = derive_features(&incident_on(2021, 3, 1 + offset as u32, 12));
            assert_eq!(features.day_of_week, day);
            assert_eq!(features.is_weekend, weekend);
        }
    }

    #[test]
    fn season_and_band_come_from_month_and_hour_attributes() {
        let features = derive_features(&incident_on(2020, 12, 24, 23));
        assert_eq!(features.season, Season::Winter);
        assert_eq!(features.hour_band, HourBand::Night);

        let features = derive_features(&incident_on(2020, 7, 4, 4));
        assert_eq!(features.season, Season::Summer);
        assert_eq!(features.hour_band, HourBand::LateNight);
    }

    #[test]
    fn unmapped_month_resolves_to_unknown_without_panicking() {
        let mut incident = incident_on(2020, 7, 4, 9);
        incident.month = 0;
        assert_eq!(derive_features(&incident).season, Season::Unknown);
    }

    #[test]
    fn enrich_all_preserves_order_and_zones() {
        let mut canal = incident_on(2019, 5, 5, 18);
        canal.street = "CANAL ST".to_string();
        let causeway = incident_on(2019, 5, 6, 18);

        let enriched = enrich_all(&[canal.clone(), causeway.clone()]);
        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].incident, canal);
        assert_eq!(enriched[0].zone, Zone::Canal);
        assert_eq!(enriched[1].zone, Zone::Causeway);
    }
}
