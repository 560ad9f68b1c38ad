//! Reading and writing the incident CSV.
//!
//! Column names follow the Boston Police Department export
//! (`OCCURRED_ON_DATE`, `STREET`, `Lat`, ...). Lower-case snake-case
//! spellings are accepted as aliases. Unknown columns are ignored.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Columns without which no incident can be built.
pub const REQUIRED_COLUMNS: &[(&str, &str)] = &[
    ("OCCURRED_ON_DATE", "occurred_on_date"),
    ("STREET", "street"),
    ("OFFENSE_DESCRIPTION", "offense_description"),
    ("Lat", "lat"),
    ("Long", "long"),
];

/// One raw CSV row. Every field is optional text; interpretation happens
/// in [`crate::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source incident number.
    #[serde(default, rename = "INCIDENT_NUMBER", alias = "incident_number")]
    pub incident_number: Option<String>,
    /// Occurrence timestamp in one of several formats.
    #[serde(default, rename = "OCCURRED_ON_DATE", alias = "occurred_on_date")]
    pub occurred_on_date: Option<String>,
    /// Offense description (e.g. `"ASSAULT - SIMPLE"`).
    #[serde(default, rename = "OFFENSE_DESCRIPTION", alias = "offense_description")]
    pub offense_description: Option<String>,
    /// Street name.
    #[serde(default, rename = "STREET", alias = "street")]
    pub street: Option<String>,
    /// Latitude.
    #[serde(default, rename = "Lat", alias = "lat")]
    pub lat: Option<String>,
    /// Longitude.
    #[serde(default, rename = "Long", alias = "long")]
    pub long: Option<String>,
    /// Hour of day.
    #[serde(default, rename = "HOUR", alias = "hour")]
    pub hour: Option<String>,
    /// Month number.
    #[serde(default, rename = "MONTH", alias = "month")]
    pub month: Option<String>,
    /// Year.
    #[serde(default, rename = "YEAR", alias = "year")]
    pub year: Option<String>,
}

/// Reads every row from a CSV file.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumns`] if a required column is absent,
/// or [`SourceError`] if the file cannot be read or parsed.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    log::info!("Reading incidents from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_records_from(file)
}

/// Reads every row from any CSV reader.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumns`] if a required column is absent,
/// or [`SourceError::Csv`] on malformed input.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<RawRecord>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|(name, alias)| !headers.iter().any(|h| h.trim() == *name || h.trim() == *alias))
        .map(|(name, _)| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SourceError::MissingColumns { columns: missing });
    }

    let records = rdr
        .deserialize::<RawRecord>()
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Read {} raw records", records.len());
    Ok(records)
}

/// Writes rows to a CSV file using the Boston column names.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be written.
pub fn write_records(path: &Path, records: &[RawRecord]) -> Result<(), SourceError> {
    let file = std::fs::File::create(path)?;
    write_records_to(file, records)?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Writes rows to any CSV writer.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] if serialization fails.
pub fn write_records_to<W: Write>(writer: W, records: &[RawRecord]) -> Result<(), SourceError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
