#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Assault incident, zone, and derived temporal feature types.
//!
//! This crate defines the canonical incident record shared by every stage
//! of the hotspot pipeline, together with the categorical labels derived
//! from it (zone, day of week, season, hour band).

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// An axis-aligned longitude/latitude box with open bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BoundingBox {
    /// Western edge (exclusive).
    pub min_longitude: f64,
    /// Eastern edge (exclusive).
    pub max_longitude: f64,
    /// Southern edge (exclusive).
    pub min_latitude: f64,
    /// Northern edge (exclusive).
    pub max_latitude: f64,
}

impl BoundingBox {
    /// Coarse box around the city of Boston used to validate coordinates.
    pub const BOSTON: Self = Self {
        min_longitude: -72.0,
        max_longitude: -70.0,
        min_latitude: 42.0,
        max_latitude: 43.0,
    };

    /// Box around the Causeway/Canal/Nashua street block next to North
    /// Station.
    pub const NORTH_STATION: Self = Self {
        min_longitude: -71.0660,
        max_longitude: -71.0580,
        min_latitude: 42.3620,
        max_latitude: 42.3690,
    };

    /// Returns `true` if the point lies strictly inside the box. NaN
    /// coordinates are never inside.
    #[must_use]
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        longitude > self.min_longitude
            && longitude < self.max_longitude
            && latitude > self.min_latitude
            && latitude < self.max_latitude
    }
}

/// Street grouping used for spatial breakdowns and coordinate correction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Zone {
    /// Causeway Street, in front of the arena.
    Causeway,
    /// Canal Street.
    Canal,
    /// Nashua Street.
    Nashua,
    /// Anything else.
    Other,
}

impl Zone {
    /// Classifies a street name by case-insensitive keyword match.
    #[must_use]
    pub fn from_street(street: &str) -> Self {
        let upper = street.to_uppercase();
        if upper.contains("CAUSEWAY") {
            Self::Causeway
        } else if upper.contains("CANAL") {
            Self::Canal
        } else if upper.contains("NASHUA") {
            Self::Nashua
        } else {
            Self::Other
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Causeway, Self::Canal, Self::Nashua, Self::Other]
    }
}

/// Day of the week with full English names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DayOfWeek {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl DayOfWeek {
    /// Returns `true` for Saturday and Sunday.
    #[must_use]
    pub const fn is_weekend(self) -> bool {
        matches!(self, Self::Saturday | Self::Sunday)
    }

    /// Returns all variants of this enum, Monday first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// Meteorological season.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Season {
    /// December, January, February
    Winter,
    /// March, April, May
    Spring,
    /// June, July, August
    Summer,
    /// September, October, November
    Fall,
    /// Month outside 1-12
    Unknown,
}

impl Season {
    /// Maps a calendar month (1-12) to its season. Anything else is
    /// [`Season::Unknown`].
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Fall,
            _ => Self::Unknown,
        }
    }
}

/// Coarse time-of-day bucket.
///
/// Buckets are half-open `(prev, next]` over the edges
/// `[-1, 4, 11, 16, 22, 24]`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum HourBand {
    /// Hours 0-4
    #[strum(serialize = "Late Night")]
    #[serde(rename = "Late Night")]
    LateNight,
    /// Hours 5-11
    Morning,
    /// Hours 12-16
    Afternoon,
    /// Hours 17-22
    Evening,
    /// Hours 23-24
    Night,
    /// Hour outside 0-24
    Unknown,
}

impl HourBand {
    /// Buckets an hour of day.
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            0..=4 => Self::LateNight,
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=22 => Self::Evening,
            23 | 24 => Self::Night,
            _ => Self::Unknown,
        }
    }

    /// Returns the known bands in chronological order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::LateNight,
            Self::Morning,
            Self::Afternoon,
            Self::Evening,
            Self::Night,
        ]
    }
}

/// One recorded assault incident after filtering and coordinate validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Incident {
    /// Source incident number, when the dataset carries one.
    pub incident_number: Option<String>,
    /// Local wall-clock time the incident occurred.
    pub occurred_at: NaiveDateTime,
    /// Longitude (WGS84 degrees).
    pub longitude: f64,
    /// Latitude (WGS84 degrees).
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
}

impl Incident {
    /// Zone derived from the street name.
    #[must_use]
    pub fn zone(&self) -> Zone {
        Zone::from_street(&self.street)
    }
}

/// Temporal labels derived from a single [`Incident`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IncidentFeatures {
    /// Day of week of the occurrence date.
    pub day_of_week: DayOfWeek,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Season of the incident month.
    pub season: Season,
    /// Time-of-day bucket of the incident hour.
    pub hour_band: HourBand,
}

/// An [`Incident`] with its zone and temporal features attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnrichedIncident {
    /// The underlying incident.
    pub incident: Incident,
    /// Zone derived from the street.
    pub zone: Zone,
    /// Derived temporal features.
    pub features: IncidentFeatures,
}
