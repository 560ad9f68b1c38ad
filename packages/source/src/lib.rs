#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Boston incident CSV ingestion.
//!
//! Reads the Boston Police Department incident export, keeps the assault
//! reports on the configured streets and years, resolves timestamps in
//! whatever format the export uses, and validates (or synthetically
//! corrects) coordinates. The result is a list of canonical
//! [`crime_hotspot_incident_models::Incident`] records ready for analysis.

pub mod correction;
pub mod csv_file;
pub mod filter;
pub mod normalize;
pub mod parsing;
pub mod progress;
pub mod synthetic;

pub use correction::{CorrectionConfig, CorrectionPolicy, ZoneAnchors};
pub use csv_file::RawRecord;
pub use filter::FilterConfig;
pub use normalize::{DateStrategy, NormalizeReport, Normalized, normalize};

/// Errors that can occur while loading incident data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input lacks columns the pipeline cannot work without.
    #[error("Input is missing required column(s): {}", columns.join(", "))]
    MissingColumns {
        /// Names of the absent columns.
        columns: Vec<String>,
    },

    /// Configuration is unusable.
    #[error("Invalid source configuration: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
