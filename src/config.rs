//! Run configuration from the operator's work item.
//!
//! A run is parameterized four ways: the search term, how many months back
//! to look, and two comma-separated filter lists (sections and categories).
//! Values come from a JSON work-item payload when one is supplied, falling
//! back to the `SEARCH` / `MONTHS` / `SECTIONS` / `CATEGORIES` environment
//! variables for each missing field.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Everything that can go wrong while assembling a [`RunConfig`], plus the
/// month-window failures detected later from the same inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required configuration key {0} is not set")]
    MissingKey(&'static str),
    #[error("MONTHS must be an integer, got {0:?}")]
    InvalidMonths(String),
    #[error("MONTHS must not be negative, got {0}")]
    NegativeMonths(i64),
    #[error("MONTHS value {0} is out of range for date arithmetic")]
    MonthsOutOfRange(i64),
    #[error("unable to read work item payload: {0}")]
    PayloadRead(#[from] std::io::Error),
    #[error("work item payload is not valid JSON: {0}")]
    PayloadSyntax(#[from] serde_json::Error),
}

/// Raw work-item payload as the operator writes it.
///
/// Every field is optional; whatever is absent here is looked up in the
/// environment instead. The list fields stay unsplit strings because the
/// payload mirrors the environment-variable format exactly.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WorkItemPayload {
    pub search: Option<String>,
    pub months: Option<i64>,
    pub sections: Option<String>,
    pub categories: Option<String>,
}

impl WorkItemPayload {
    /// Parse a payload from a JSON file on disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Fully resolved parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub search: String,
    pub months: i64,
    pub sections: Vec<String>,
    pub categories: Vec<String>,
}

impl RunConfig {
    /// Resolve the run configuration from an optional payload file plus the
    /// process environment.
    ///
    /// # Arguments
    ///
    /// * `payload_path` - Path to a JSON work-item payload, if the operator
    ///   provided one. Fields it omits fall back to environment variables.
    ///
    /// # Returns
    ///
    /// The resolved [`RunConfig`], or a [`ConfigError`] when the payload is
    /// unreadable or a required key is missing or malformed. `SEARCH` and
    /// `MONTHS` are required; the two list keys default to empty.
    pub fn load(payload_path: Option<&Path>) -> Result<Self, ConfigError> {
        let payload = match payload_path {
            Some(path) => {
                info!(path = %path.display(), "Loading work item payload");
                WorkItemPayload::from_file(path)?
            }
            None => WorkItemPayload::default(),
        };
        Self::from_lookup(&payload, &|key| env::var(key).ok())
    }

    /// Resolve configuration from a payload plus an arbitrary key lookup.
    ///
    /// Split out from [`RunConfig::load`] so tests can supply a map instead
    /// of mutating the process environment.
    pub fn from_lookup(
        payload: &WorkItemPayload,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let search = payload
            .search
            .clone()
            .or_else(|| lookup("SEARCH"))
            .ok_or(ConfigError::MissingKey("SEARCH"))?;

        let months = match payload.months {
            Some(value) => value,
            None => parse_months(&lookup("MONTHS").ok_or(ConfigError::MissingKey("MONTHS"))?)?,
        };

        let sections = payload
            .sections
            .clone()
            .or_else(|| lookup("SECTIONS"))
            .map(|raw| split_list(&raw))
            .unwrap_or_default();
        let categories = payload
            .categories
            .clone()
            .or_else(|| lookup("CATEGORIES"))
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        Ok(RunConfig {
            search,
            months,
            sections,
            categories,
        })
    }
}

fn parse_months(raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidMonths(raw.to_string()))
}

/// Split a comma-separated list the way operators actually type them.
///
/// Separator whitespace is normalized first (`" , "`, `" ,"` and `", "` all
/// collapse to a bare comma), then empty fragments are dropped, so `""` and
/// `"a, b ,c , d"` behave as expected.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.replace(" , ", ", ")
        .replace(" ,", ", ")
        .replace(", ", ",")
        .split(',')
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}
