//! Report settings.
//!
//! Settings come from three layers, later ones winning: built-in defaults, an optional JSON file
//! (`--config`), and command-line flags. Unknown keys in the file are rejected so a typo does not
//! silently fall back to a default.

use std::fs;
use std::path::{Path, PathBuf};

use emr_pivot::{BucketScheme, DegeneratePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::ReportSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown report id {0:?}")]
    UnknownReport(String),
    #[error("histogram_bins must be at least 1")]
    InvalidHistogramBins,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    /// Scheme for the grouped-bar age report.
    pub age_bands: BucketScheme,
    /// Scheme for the age-group heatmaps.
    pub life_stages: BucketScheme,
    pub degenerate_policy: DegeneratePolicy,
    /// Fail the whole run (instead of skipping the report) when a required column is missing.
    pub strict_columns: bool,
    pub histogram_bins: usize,
    /// Report ids to run; empty means every registered report.
    pub reports: Vec<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            age_bands: BucketScheme::twenty_year_bands(),
            life_stages: BucketScheme::life_stages(),
            degenerate_policy: DegeneratePolicy::default(),
            strict_columns: false,
            histogram_bins: 20,
            reports: Vec::new(),
        }
    }
}

impl ReportSettings {
    pub fn from_json_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.reports.is_empty() || self.reports.iter().any(|r| r == id)
    }

    pub fn validate(&self, registry: &[ReportSpec]) -> Result<(), ConfigError> {
        if self.histogram_bins == 0 {
            return Err(ConfigError::InvalidHistogramBins);
        }
        if let Some(unknown) = self
            .reports
            .iter()
            .find(|id| !registry.iter().any(|spec| spec.id == id.as_str()))
        {
            return Err(ConfigError::UnknownReport(unknown.clone()));
        }
        Ok(())
    }
}
