#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot analysis over filtered assault incidents.
//!
//! Ties the stages together: features, density at the operating radius,
//! model comparison, hotspot classification, and pattern aggregates. Also
//! owns the run configuration and the CSV/JSON/GeoJSON/text exports that
//! renderers and report writers consume.

pub mod config;
pub mod export;
pub mod hotspot;
pub mod patterns;
pub mod pipeline;
pub mod summary;

pub use config::AnalysisConfig;
pub use pipeline::{Analysis, AnalysisReport, analyze, analyze_records};

use crime_hotspot_modeling::ModelError;
use crime_hotspot_source::SourceError;
use crime_hotspot_spatial::DensityError;

/// Errors that can occur while running or exporting an analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Loading or normalizing incidents failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Density computation failed.
    #[error(transparent)]
    Density(#[from] DensityError),

    /// A model could not be fitted or evaluated.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Nothing survived filtering.
    #[error("No incidents left to analyze after filtering ({raw_rows} input rows)")]
    NoIncidents {
        /// Rows in the input.
        raw_rows: usize,
    },

    /// Hotspots were requested for an empty density vector.
    #[error("Cannot classify hotspots over zero incidents")]
    EmptyDensity,

    /// Configuration is unusable.
    #[error("Invalid analysis configuration: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration TOML could not be parsed.
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML.
    #[error("Config render error: {0}")]
    TomlRender(#[from] toml::ser::Error),

    /// JSON (or GeoJSON) serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
