//! Run configuration.
//!
//! The defaults live in `config/default.toml`, embedded at compile time. A
//! user file is layered on top: every section and key is optional, and
//! anything omitted keeps its default.

use std::path::Path;

use crime_hotspot_analytics_models::{HotspotConfig, SyntheticConfig};
use crime_hotspot_modeling::evaluate::validate_config;
use crime_hotspot_modeling_models::ModelConfig;
use crime_hotspot_source::{CorrectionConfig, FilterConfig};
use crime_hotspot_spatial::{DensityConfig, DensityError};
use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// Embedded default configuration.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Everything that parameterizes one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Offense, street and year selection.
    pub filter: FilterConfig,
    /// Candidate and operating radii.
    pub density: DensityConfig,
    /// Split, kNN, cross-validation and ensemble settings.
    pub model: ModelConfig,
    /// Hotspot quantile.
    pub hotspot: HotspotConfig,
    /// Out-of-bounds coordinate handling.
    pub correction: CorrectionConfig,
    /// Synthetic incident generation.
    pub synthetic: SyntheticConfig,
}

impl AnalysisConfig {
    /// Parses the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the embedded file is malformed.
    pub fn embedded() -> Result<Self, AnalyticsError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::TomlParse`] for malformed TOML and a
    /// validation error for unusable values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, AnalyticsError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file, or the embedded defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: Option<&Path>) -> Result<Self, AnalyticsError> {
        match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)
            }
            None => Self::embedded(),
        }
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::TomlRender`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, AnalyticsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, as the owning crate's error.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        self.filter.validate()?;
        self.correction.validate()?;
        validate_config(&self.model)?;

        let density = &self.density;
        if !(density.radius.is_finite() && density.radius > 0.0) {
            return Err(DensityError::InvalidRadius {
                radius: density.radius,
            }
            .into());
        }
        if let Some(&radius) = density
            .candidate_radii
            .iter()
            .find(|r| !(r.is_finite() && **r > 0.0))
        {
            return Err(DensityError::InvalidRadius { radius }.into());
        }
        if !density.candidate_radii.contains(&density.radius) {
            log::warn!(
                "Operating radius {} is not one of the candidate radii {:?}",
                density.radius,
                density.candidate_radii
            );
        }

        let quantile = self.hotspot.quantile;
        if !(0.0..=1.0).contains(&quantile) {
            return Err(AnalyticsError::Config {
                message: format!("hotspot quantile must be in [0, 1], got {quantile}"),
            });
        }

        let bounds = &self.synthetic.bounds;
        if !(bounds.min_longitude < bounds.max_longitude
            && bounds.min_latitude < bounds.max_latitude)
        {
            return Err(AnalyticsError::Config {
                message: format!("synthetic bounds are empty: {bounds:?}"),
            });
        }
        Ok(())
    }
}
