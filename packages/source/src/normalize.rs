//! Raw CSV rows to canonical incidents.
//!
//! Order of operations: offense/street filter, timestamp resolution,
//! hour/month/year derivation, year filter, coordinate parsing, coordinate
//! correction. Timestamp problems never abort the run; they degrade to
//! coarser dates with a warning.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use crime_hotspot_incident_models::{Incident, Zone};
use serde::{Deserialize, Serialize};

use crate::SourceError;
use crate::correction::{CorrectionConfig, correct_coordinates};
use crate::csv_file::RawRecord;
use crate::filter::FilterConfig;
use crate::parsing::{DateFormat, parse_f64, parse_i64, sniff_date_format};

/// First day used when dates have to be invented.
const SEQUENTIAL_START: (i32, u32, u32) = (2019, 1, 1);

/// How occurrence timestamps were obtained for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DateStrategy {
    /// A known format parsed more than 90% of rows.
    Format {
        /// The accepted `chrono` pattern.
        pattern: String,
    },
    /// No format qualified; dates were rebuilt from `YEAR`/`MONTH`.
    CoarseYearMonth,
    /// No format qualified and `YEAR`/`MONTH` were unusable for at least
    /// one row; sequential daily dates were invented.
    Sequential,
}

/// Row accounting for one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NormalizeReport {
    /// Rows in the input.
    pub raw_rows: usize,
    /// Rows matching the offense and street filters.
    pub matched_rows: usize,
    /// Strategy used for timestamps, `None` when nothing matched.
    pub date_strategy: Option<DateStrategy>,
    /// Rows whose date was rebuilt from `YEAR`/`MONTH`.
    pub coarse_dates: usize,
    /// Rows whose date was invented.
    pub sequential_dates: usize,
    /// Rows dropped because no date could be resolved.
    pub dropped_unresolved_dates: usize,
    /// Rows dropped by the year range.
    pub out_of_year_range: usize,
    /// Rows dropped for missing or NaN coordinates.
    pub dropped_missing_coordinates: usize,
    /// Rows whose coordinates were synthesized.
    pub corrected_coordinates: usize,
    /// Incidents produced.
    pub incidents: usize,
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Canonical incidents, in input order.
    pub incidents: Vec<Incident>,
    /// Row accounting.
    pub report: NormalizeReport,
}

/// How a single row's timestamp was resolved.
enum Resolved {
    Parsed(NaiveDateTime),
    Coarse(NaiveDateTime),
    Sequential(NaiveDateTime),
}

impl Resolved {
    const fn timestamp(&self) -> NaiveDateTime {
        match self {
            Self::Parsed(ts) | Self::Coarse(ts) | Self::Sequential(ts) => *ts,
        }
    }
}

/// Filters and converts raw rows into incidents.
///
/// `seed` drives the coordinate-correction jitter only.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if either configuration is invalid.
#[allow(clippy::too_many_lines)]
pub fn normalize(
    records: &[RawRecord],
    filter: &FilterConfig,
    correction: &CorrectionConfig,
    seed: u64,
) -> Result<Normalized, SourceError> {
    filter.validate()?;
    correction.validate()?;

    let mut report = NormalizeReport {
        raw_rows: records.len(),
        ..NormalizeReport::default()
    };

    let matched: Vec<&RawRecord> = records
        .iter()
        .filter(|r| {
            r.offense_description
                .as_deref()
                .is_some_and(|o| filter.matches_offense(o))
                && r.street.as_deref().is_some_and(|s| filter.matches_street(s))
        })
        .collect();
    report.matched_rows = matched.len();
    log::info!(
        "{} of {} rows match offense {:?} on streets {:?}",
        matched.len(),
        records.len(),
        filter.offense_keywords,
        filter.streets
    );

    if matched.is_empty() {
        return Ok(Normalized {
            incidents: Vec::new(),
            report,
        });
    }

    let values: Vec<Option<&str>> = matched
        .iter()
        .map(|r| r.occurred_on_date.as_deref())
        .collect();
    let format = sniff_date_format(&values);
    match &format {
        Some(f) => log::info!("Using timestamp format {:?}", f.pattern),
        None => log::warn!(
            "No known timestamp format parses more than 90% of rows; \
             falling back to YEAR/MONTH dates (or invented sequential dates)"
        ),
    }

    // Resolve timestamps, derive calendar fields, apply the year filter.
    let mut kept: Vec<(&RawRecord, NaiveDateTime, u32, u32, i32)> = Vec::new();
    for (position, record) in matched.iter().enumerate() {
        let Some(resolved) = resolve_timestamp(record, format.as_ref(), position) else {
            report.dropped_unresolved_dates += 1;
            continue;
        };
        match resolved {
            Resolved::Parsed(_) => {}
            Resolved::Coarse(_) => report.coarse_dates += 1,
            Resolved::Sequential(_) => report.sequential_dates += 1,
        }
        let ts = resolved.timestamp();

        let hour = column_hour(record).unwrap_or_else(|| ts.hour());
        let month = column_month(record).unwrap_or_else(|| ts.month());
        let year = column_year(record).unwrap_or_else(|| ts.year());

        if !filter.matches_year(year) {
            report.out_of_year_range += 1;
            continue;
        }
        kept.push((record, ts, hour, month, year));
    }

    report.date_strategy = Some(match format {
        Some(f) => DateStrategy::Format {
            pattern: f.pattern.to_string(),
        },
        None if report.sequential_dates > 0 => DateStrategy::Sequential,
        None => DateStrategy::CoarseYearMonth,
    });
    if report.coarse_dates > 0 {
        log::warn!(
            "{} row(s) use a coarse first-of-month date built from YEAR/MONTH",
            report.coarse_dates
        );
    }
    if report.sequential_dates > 0 {
        log::warn!(
            "{} row(s) use INVENTED sequential dates; temporal patterns are not meaningful",
            report.sequential_dates
        );
    }
    if report.dropped_unresolved_dates > 0 {
        log::warn!(
            "Dropped {} row(s) whose timestamp could not be resolved",
            report.dropped_unresolved_dates
        );
    }

    // Coordinates: missing/NaN drops the row, out-of-bounds is corrected.
    let mut located = Vec::with_capacity(kept.len());
    for entry in kept {
        let record = entry.0;
        let lat = parse_f64(record.lat.as_deref());
        let lon = parse_f64(record.long.as_deref());
        match (lon, lat) {
            (Some(lon), Some(lat)) if !lon.is_nan() && !lat.is_nan() => {
                located.push((entry, [lon, lat]));
            }
            _ => report.dropped_missing_coordinates += 1,
        }
    }
    if report.dropped_missing_coordinates > 0 {
        log::warn!(
            "Dropped {} row(s) with missing coordinates",
            report.dropped_missing_coordinates
        );
    }

    let zoned: Vec<(Zone, [f64; 2])> = located
        .iter()
        .map(|((record, ..), position)| {
            (
                Zone::from_street(record.street.as_deref().unwrap_or_default()),
                *position,
            )
        })
        .collect();
    let placements = correct_coordinates(&zoned, correction, seed);

    let incidents: Vec<Incident> = located
        .into_iter()
        .zip(placements)
        .map(|(((record, ts, hour, month, year), _), placement)| Incident {
            incident_number: record.incident_number.clone().filter(|s| !s.is_empty()),
            occurred_at: ts,
            longitude: placement.position[0],
            latitude: placement.position[1],
            street: record.street.clone().unwrap_or_default().trim().to_string(),
            offense_description: record
                .offense_description
                .clone()
                .unwrap_or_default()
                .trim()
                .to_string(),
            hour,
            month,
            year,
            coordinates_corrected: placement.corrected,
        })
        .collect();

    report.corrected_coordinates = incidents.iter().filter(|i| i.coordinates_corrected).count();
    report.incidents = incidents.len();

    log::info!(
        "Normalized {} incidents from {} raw rows ({} corrected coordinates)",
        report.incidents,
        report.raw_rows,
        report.corrected_coordinates
    );

    Ok(Normalized { incidents, report })
}

fn resolve_timestamp(
    record: &RawRecord,
    format: Option<&DateFormat>,
    position: usize,
) -> Option<Resolved> {
    if let Some(format) = format {
        if let Some(ts) = record.occurred_on_date.as_deref().and_then(|s| format.parse(s)) {
            return Some(Resolved::Parsed(ts));
        }
        return coarse_timestamp(record).map(Resolved::Coarse);
    }

    coarse_timestamp(record)
        .map(Resolved::Coarse)
        .or_else(|| sequential_timestamp(record, position).map(Resolved::Sequential))
}

/// First of the month from `YEAR`/`MONTH`, at `HOUR` when present.
fn coarse_timestamp(record: &RawRecord) -> Option<NaiveDateTime> {
    let year = column_year(record)?;
    let month = column_month(record)?;
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(column_hour(record).unwrap_or(0), 0, 0)
}

/// One invented day per row position, starting at [`SEQUENTIAL_START`].
fn sequential_timestamp(record: &RawRecord, position: usize) -> Option<NaiveDateTime> {
    let (y, m, d) = SEQUENTIAL_START;
    NaiveDate::from_ymd_opt(y, m, d)?
        .checked_add_days(Days::new(u64::try_from(position).ok()?))?
        .and_hms_opt(column_hour(record).unwrap_or(0), 0, 0)
}

fn column_hour(record: &RawRecord) -> Option<u32> {
    parse_i64(record.hour.as_deref())
        .and_then(|h| u32::try_from(h).ok())
        .filter(|h| *h <= 23)
}

fn column_month(record: &RawRecord) -> Option<u32> {
    parse_i64(record.month.as_deref())
        .and_then(|m| u32::try_from(m).ok())
        .filter(|m| (1..=12).contains(m))
}

fn column_year(record: &RawRecord) -> Option<i32> {
    parse_i64(record.year.as_deref()).and_then(|y| i32::try_from(y).ok())
}
