//! Offense, street, and year filtering.
//!
//! Offense matching is keyword-based and case-insensitive. Street matching
//! compares normalized names (upper-case, single-spaced) for equality so
//! that `"CAUSEWAY ST"` does not also pick up `"N CAUSEWAY ST EXT"`.

use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Which rows count as in-scope assault incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FilterConfig {
    /// Offense description keywords; any match keeps the row.
    pub offense_keywords: Vec<String>,
    /// Street names to keep.
    pub streets: Vec<String>,
    /// First year kept (inclusive).
    pub year_from: i32,
    /// Last year kept (inclusive).
    pub year_to: i32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            offense_keywords: vec!["ASSAULT".to_string()],
            streets: vec![
                "CAUSEWAY ST".to_string(),
                "CANAL ST".to_string(),
                "NASHUA ST".to_string(),
            ],
            year_from: 2019,
            year_to: 2022,
        }
    }
}

impl FilterConfig {
    /// Checks the configuration for obviously unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if no keywords or streets are given
    /// or the year range is inverted.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.offense_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(SourceError::Config {
                message: "at least one offense keyword is required".to_string(),
            });
        }
        if self.streets.iter().all(|s| s.trim().is_empty()) {
            return Err(SourceError::Config {
                message: "at least one street is required".to_string(),
            });
        }
        if self.year_from > self.year_to {
            return Err(SourceError::Config {
                message: format!(
                    "year_from ({}) is after year_to ({})",
                    self.year_from, self.year_to
                ),
            });
        }
        Ok(())
    }

    /// Returns `true` if the offense description contains any keyword.
    #[must_use]
    pub fn matches_offense(&self, offense: &str) -> bool {
        let upper = offense.to_uppercase();
        contains_any(
            &upper,
            self.offense_keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty()),
        )
    }

    /// Returns `true` if the street is one of the configured streets.
    #[must_use]
    pub fn matches_street(&self, street: &str) -> bool {
        let street = normalize_street(street);
        self.streets.iter().any(|s| normalize_street(s) == street)
    }

    /// Returns `true` if the year is inside the configured range.
    #[must_use]
    pub const fn matches_year(&self, year: i32) -> bool {
        year >= self.year_from && year <= self.year_to
    }
}

/// Upper-cases and collapses internal whitespace.
#[must_use]
pub fn normalize_street(street: &str) -> String {
    street
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn contains_any(haystack: &str, needles: impl IntoIterator<Item = String>) -> bool {
    needles.into_iter().any(|n| haystack.contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_assault_offenses_case_insensitively() {
        let config = FilterConfig::default();
        assert!(config.matches_offense("ASSAULT - SIMPLE"));
        assert!(config.matches_offense("Assault - Aggravated"));
        assert!(!config.matches_offense("LARCENY THEFT FROM BUILDING"));
    }

    #[test]
    fn matches_streets_by_normalized_equality() {
        let config = FilterConfig::default();
        assert!(config.matches_street("CAUSEWAY ST"));
        assert!(config.matches_street("  canal   st "));
        assert!(!config.matches_street("N CAUSEWAY ST EXT"));
        assert!(!config.matches_street("PORTLAND ST"));
    }

    #[test]
    fn year_range_is_inclusive() {
        let config = FilterConfig::default();
        assert!(!config.matches_year(2018));
        assert!(config.matches_year(2019));
        assert!(config.matches_year(2022));
        assert!(!config.matches_year(2023));
    }

    #[test]
    fn rejects_inverted_year_range() {
        let config = FilterConfig {
            year_from: 2023,
            year_to: 2019,
            ..FilterConfig::default()
        };
        assert!(matches!(config.validate(), Err(SourceError::Config { .. })));
        assert!(FilterConfig::default().validate().is_ok());
    }
}
