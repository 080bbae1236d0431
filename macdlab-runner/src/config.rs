//! Serializable run configuration.
//!
//! A run is described by a TOML file with four sections, all optional:
//!
//! ```toml
//! [run]
//! symbol = "IBM"
//! start_date = "2021-01-04"
//! investment = 100000.0
//!
//! [macd]
//! slow = 26
//! fast = 12
//! smooth = 9
//!
//! [backtest]
//! timing = "prior_bar"        # or "same_bar"
//! initial_position = "flat"   # or "long"
//!
//! [data]
//! source = "alpha_vantage"    # or "csv", "synthetic"
//! api_key_file = "api_key.txt"
//! output_size = "compact"     # or "full"
//! ```
//!
//! CLI flags override file values after loading.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use macdlab_core::backtest::{BacktestConfig, PositionTiming};
use macdlab_core::data::OutputSize;
use macdlab_core::indicators::MacdParams;
use macdlab_core::pipeline::PipelineConfig;
use macdlab_core::positions::InitialPosition;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run: RunSection,
    pub macd: MacdParams,
    pub backtest: BacktestSection,
    pub data: DataSection,
}

/// `[run]`: what to run on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub symbol: String,
    /// Keep bars on or after this date. `None` uses the whole history.
    pub start_date: Option<NaiveDate>,
    pub investment: f64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            start_date: None,
            investment: 100_000.0,
        }
    }
}

/// `[backtest]`: simulation conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub timing: PositionTiming,
    pub initial_position: InitialPosition,
}

/// Which price history provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    AlphaVantage,
    Csv,
    Synthetic,
}

/// `[data]`: provider settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub source: SourceKind,
    /// Required when `source = "csv"`.
    pub csv_path: Option<PathBuf>,
    /// Key file for Alpha Vantage; the environment variable takes precedence.
    pub api_key_file: Option<PathBuf>,
    pub output_size: OutputSize,
    /// Last date of the synthetic walk. Defaults to today.
    pub synthetic_end: Option<NaiveDate>,
}

impl RunConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check every precondition the pipeline would otherwise reject later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if !self.run.investment.is_finite() || self.run.investment <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "investment must be a positive number, got {}",
                self.run.investment
            )));
        }
        self.macd
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.data.source == SourceKind::Csv && self.data.csv_path.is_none() {
            return Err(ConfigError::Invalid(
                "data.csv_path is required when data.source = \"csv\"".into(),
            ));
        }
        Ok(())
    }

    /// Pipeline settings derived from this config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            macd: self.macd,
            initial_position: self.backtest.initial_position,
            backtest: BacktestConfig::new(self.run.investment).with_timing(self.backtest.timing),
        }
    }
}
