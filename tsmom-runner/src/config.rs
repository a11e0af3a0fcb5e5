//! Run configuration file: analysis knobs plus report, data and render settings.
//!
//! Every section is optional; a missing key takes its default. CLI flags are
//! applied on top of the loaded value by the caller.

use crate::render::RenderConfig;
use crate::report::ReportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tsmom_core::{AnalysisConfig, InvalidConfig};

/// Accepted lookback horizon in years.
pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 20;

/// Errors loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] InvalidConfig),

    #[error("years must be in {MIN_YEARS}..={MAX_YEARS}, got {0}")]
    YearsOutOfRange(u32),
}

/// Where prices are cached and for how long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root of the Parquet price store.
    pub cache_dir: PathBuf,
    /// Store and memory entries older than this are refetched. `None` keeps
    /// them until the trading day rolls over.
    pub max_cache_age_hours: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data"),
            max_cache_age_hours: None,
        }
    }
}

/// Complete configuration for `tsmom analyze` and friends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsmomConfig {
    /// Instrument analyzed when none is given on the command line.
    pub instrument: Option<String>,
    /// Lookback horizon in years.
    pub years: u32,
    pub analysis: AnalysisConfig,
    pub report: ReportConfig,
    pub data: DataConfig,
    pub render: RenderConfig,
}

impl Default for TsmomConfig {
    fn default() -> Self {
        Self {
            instrument: None,
            years: MAX_YEARS,
            analysis: AnalysisConfig::default(),
            report: ReportConfig::default(),
            data: DataConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl TsmomConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_years(self.years)?;
        self.analysis.validate()?;
        Ok(())
    }
}

pub fn validate_years(years: u32) -> Result<(), ConfigError> {
    if (MIN_YEARS..=MAX_YEARS).contains(&years) {
        Ok(())
    } else {
        Err(ConfigError::YearsOutOfRange(years))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = TsmomConfig::from_toml("").unwrap();
        assert_eq!(config, TsmomConfig::default());
        assert_eq!(config.years, 20);
        assert_eq!(config.analysis.scan.max_window, 254);
        assert!(config.report.gate_on_benchmark);
        assert_eq!(config.data.cache_dir, PathBuf::from("data"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = TsmomConfig::from_toml(
            r#"
            instrument = "2330.TW"
            years = 5

            [analysis.simulation]
            target_vol = 0.25

            [data]
            max_cache_age_hours = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.instrument.as_deref(), Some("2330.TW"));
        assert_eq!(config.years, 5);
        assert_eq!(config.analysis.simulation.target_vol, 0.25);
        assert_eq!(config.analysis.simulation.vol_window, 60);
        assert_eq!(config.data.max_cache_age_hours, Some(12));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = TsmomConfig::default();
        config.years = 7;
        config.report.gate_on_benchmark = false;
        let text = config.to_toml().unwrap();
        assert_eq!(TsmomConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn years_out_of_range_rejected() {
        assert!(matches!(
            TsmomConfig::from_toml("years = 0"),
            Err(ConfigError::YearsOutOfRange(0))
        ));
        assert!(matches!(
            TsmomConfig::from_toml("years = 21"),
            Err(ConfigError::YearsOutOfRange(21))
        ));
    }

    #[test]
    fn invalid_analysis_rejected() {
        let err = TsmomConfig::from_toml("[analysis.scan]\nmin_window = 300").unwrap_err();
        assert!(err.to_string().contains("scan.max_window"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = TsmomConfig::from_file(Path::new("/nonexistent/tsmom.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tsmom.toml"));
    }
}
