//! Timestamp and numeric field parsing.
//!
//! The Boston export has shipped `OCCURRED_ON_DATE` in several shapes over
//! the years (with and without a UTC offset, US-style month/day, date
//! only). [`sniff_date_format`] picks the first known format that parses a
//! clear majority of the rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Share of rows a format must parse to be accepted.
pub const DATE_FORMAT_ACCEPT_RATIO: f64 = 0.9;

/// How a [`DateFormat`] pattern is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormatKind {
    /// Pattern includes a UTC offset; the wall-clock time in that offset
    /// is kept.
    WithOffset,
    /// Pattern is a plain date and time.
    Naive,
    /// Pattern is a date only; midnight is assumed.
    DateOnly,
}

/// A candidate timestamp format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormat {
    /// `chrono` strftime pattern.
    pub pattern: &'static str,
    /// How to interpret the pattern.
    pub kind: DateFormatKind,
}

impl DateFormat {
    /// Parses a single value with this format.
    #[must_use]
    pub fn parse(&self, s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        match self.kind {
            DateFormatKind::WithOffset => DateTime::parse_from_str(s, self.pattern)
                .ok()
                .map(|dt| dt.naive_local()),
            DateFormatKind::Naive => NaiveDateTime::parse_from_str(s, self.pattern).ok(),
            DateFormatKind::DateOnly => NaiveDate::parse_from_str(s, self.pattern)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        }
    }
}

/// Known formats, tried in order.
pub const DATE_FORMATS: &[DateFormat] = &[
    DateFormat {
        pattern: "%Y-%m-%d %H:%M:%S%#z",
        kind: DateFormatKind::WithOffset,
    },
    DateFormat {
        pattern: "%Y-%m-%d %H:%M:%S",
        kind: DateFormatKind::Naive,
    },
    DateFormat {
        pattern: "%Y-%m-%dT%H:%M:%S%.f",
        kind: DateFormatKind::Naive,
    },
    DateFormat {
        pattern: "%m/%d/%Y %H:%M",
        kind: DateFormatKind::Naive,
    },
    DateFormat {
        pattern: "%m/%d/%Y %I:%M:%S %p",
        kind: DateFormatKind::Naive,
    },
    DateFormat {
        pattern: "%Y-%m-%d",
        kind: DateFormatKind::DateOnly,
    },
];

/// Returns the first format in [`DATE_FORMATS`] that parses more than
/// [`DATE_FORMAT_ACCEPT_RATIO`] of `values`. Missing values count as
/// failures.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sniff_date_format(values: &[Option<&str>]) -> Option<DateFormat> {
    if values.is_empty() {
        return None;
    }
    let total = values.len() as f64;

    DATE_FORMATS.iter().copied().find(|format| {
        let parsed = values
            .iter()
            .filter(|v| v.is_some_and(|s| format.parse(s).is_some()))
            .count();
        let ratio = parsed as f64 / total;
        log::debug!("Date format {:?} parses {:.1}% of rows", format.pattern, ratio * 100.0);
        ratio > DATE_FORMAT_ACCEPT_RATIO
    })
}

/// Parses an optional numeric field. Blank and unparseable values are
/// `None`; `NaN` parses to `NaN` and is left to the caller to reject.
#[must_use]
pub fn parse_f64(value: Option<&str>) -> Option<f64> {
    value.map(str::trim).filter(|s| !s.is_empty())?.parse().ok()
}

/// Parses an optional integer field, accepting float spellings such as
/// `"7.0"` that spreadsheet round trips produce.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_i64(value: Option<&str>) -> Option<i64> {
    let s = value.map(str::trim).filter(|s| !s.is_empty())?;
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}
