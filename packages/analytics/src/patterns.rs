//! Temporal and spatial aggregates for reporting.

use std::collections::BTreeMap;

use crime_hotspot_analytics_models::{CategoryCount, SpatialPatterns, TemporalPatterns, ZoneStats};
use crime_hotspot_incident_models::{DayOfWeek, EnrichedIncident, HourBand, Season, Zone};

fn count_by<T: Copy + PartialEq + AsRef<str>>(
    categories: &[T],
    values: impl Iterator<Item = T> + Clone,
) -> Vec<CategoryCount> {
    categories
        .iter()
        .map(|category| CategoryCount {
            label: category.as_ref().to_string(),
            count: values.clone().filter(|v| v == category).count(),
        })
        .collect()
}

/// Counts incidents per hour band, weekday, season and year.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn temporal_patterns(incidents: &[EnrichedIncident]) -> TemporalPatterns {
    let by_hour_band = count_by(
        HourBand::all(),
        incidents.iter().map(|i| i.features.hour_band),
    );
    let by_day_of_week = count_by(
        DayOfWeek::all(),
        incidents.iter().map(|i| i.features.day_of_week),
    );
    let by_season = count_by(
        &[Season::Winter, Season::Spring, Season::Summer, Season::Fall],
        incidents.iter().map(|i| i.features.season),
    );

    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    let mut hours = [0_usize; 24];
    for enriched in incidents {
        *years.entry(enriched.incident.year).or_default() += 1;
        if let Some(slot) = hours.get_mut(enriched.incident.hour as usize) {
            *slot += 1;
        }
    }
    let by_year = years
        .into_iter()
        .map(|(year, count)| CategoryCount {
            label: year.to_string(),
            count,
        })
        .collect();

    let peak_hour = (0_u32..)
        .zip(hours)
        .filter(|&(_, count)| count > 0)
        .fold(None, |best: Option<(u32, usize)>, (hour, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((hour, count)),
        })
        .map(|(hour, _)| hour);

    let weekend = incidents.iter().filter(|i| i.features.is_weekend).count();
    let weekend_share = if incidents.is_empty() {
        0.0
    } else {
        weekend as f64 / incidents.len() as f64
    };

    TemporalPatterns {
        by_hour_band,
        by_day_of_week,
        by_season,
        by_year,
        peak_hour,
        weekend_share,
    }
}

/// Per-zone incident counts, hotspot counts and mean density.
///
/// `densities` and `hotspots` are aligned with `incidents`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn spatial_patterns(
    incidents: &[EnrichedIncident],
    densities: &[u32],
    hotspots: &[bool],
) -> SpatialPatterns {
    let zones = Zone::all()
        .iter()
        .filter_map(|&zone| {
            let members: Vec<usize> = incidents
                .iter()
                .enumerate()
                .filter(|(_, i)| i.zone == zone)
                .map(|(idx, _)| idx)
                .collect();
            if members.is_empty() {
                return None;
            }
            let total_density: u64 = members
                .iter()
                .filter_map(|&idx| densities.get(idx))
                .map(|&d| u64::from(d))
                .sum();
            Some(ZoneStats {
                zone,
                incidents: members.len(),
                hotspots: members
                    .iter()
                    .filter(|&&idx| hotspots.get(idx).copied().unwrap_or(false))
                    .count(),
                mean_density: total_density as f64 / members.len() as f64,
            })
        })
        .collect();

    SpatialPatterns {
        zones,
        corrected_coordinates: incidents
            .iter()
            .filter(|i| i.incident.coordinates_corrected)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_hotspot_features::enrich;
    use crime_hotspot_incident_models::Incident;

    use super::*;

    fn incident(street: &str, day: u32, hour: u32) -> EnrichedIncident {
        // 2022-01-03 is a Monday.
        let occurred_at = NaiveDate::from_ymd_opt(2022, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        enrich(&Incident {
            incident_number: None,
            occurred_at,
            longitude: -71.06,
            latitude: 42.366,
            street: street.to_string(),
            offense_description: "ASSAULT - SIMPLE".to_string(),
            hour,
            month: 1,
            year: 2022,
            coordinates_corrected: day == 8,
        })
    }

    fn sample() -> Vec<EnrichedIncident> {
        vec![
            incident("CAUSEWAY ST", 3, 23),
            incident("CAUSEWAY ST", 8, 23),
            incident("CANAL ST", 9, 2),
            incident("CAUSEWAY ST", 4, 14),
        ]
    }

    #[test]
    fn temporal_counts_cover_every_incident() {
        let patterns = temporal_patterns(&sample());
        let band_total: usize = patterns.by_hour_band.iter().map(|c| c.count).sum();
        let day_total: usize = patterns.by_day_of_week.iter().map(|c| c.count).sum();
        assert_eq!(band_total, 4);
        assert_eq!(day_total, 4);
        assert_eq!(patterns.peak_hour, Some(23));
        // Saturday the 8th and Sunday the 9th.
        assert!((patterns.weekend_share - 0.5).abs() < 1e-12);
        assert_eq!(
            patterns.by_season[0],
            CategoryCount {
                label: "Winter".to_string(),
                count: 4
            }
        );
        assert_eq!(patterns.by_year.len(), 1);
    }

    #[test]
    fn spatial_stats_per_zone() {
        let patterns = spatial_patterns(&sample(), &[4, 2, 1, 3], &[true, false, false, true]);
        assert_eq!(patterns.zones.len(), 2);

        let causeway = &patterns.zones[0];
        assert_eq!(causeway.zone, Zone::Causeway);
        assert_eq!(causeway.incidents, 3);
        assert_eq!(causeway.hotspots, 2);
        assert!((causeway.mean_density - 3.0).abs() < 1e-12);
        assert_eq!(patterns.corrected_coordinates, 1);
    }

    #[test]
    fn empty_input_has_no_peak_and_no_zones() {
        let temporal = temporal_patterns(&[]);
        assert_eq!(temporal.peak_hour, None);
        assert!(temporal.weekend_share.abs() < f64::EPSILON);
        assert!(spatial_patterns(&[], &[], &[]).zones.is_empty());
    }
}
