//! Run orchestration: config → data → pipeline → summary.
//!
//! Two entry points:
//! - `run()`: resolves the provider from the config, loads data, then runs. Used by the CLI.
//! - `run_with_provider()`: takes an explicit provider. Used by tests and offline callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use macdlab_core::data::{DataSource, PriceHistoryProvider};
use macdlab_core::fingerprint::RunFingerprint;
use macdlab_core::pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
use macdlab_core::MacdError;

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{build_provider, load_bars, LoadError, LoadOptions};
use crate::metrics::RunSummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] MacdError),
}

/// Current schema version for the JSON report.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub source: DataSource,
    pub config: PipelineConfig,
    pub fingerprint: RunFingerprint,
    pub summary: RunSummary,
    pub output: PipelineOutput,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunReport {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Run from a validated config, building the configured provider.
pub fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    config.validate()?;
    let opts = load_options(config);
    let provider = build_provider(&config.data, &opts)?;
    run_with_provider(config, provider.as_ref())
}

/// Run against an explicit provider.
pub fn run_with_provider(
    config: &RunConfig,
    provider: &dyn PriceHistoryProvider,
) -> Result<RunReport, RunError> {
    config.validate()?;
    let symbol = config.run.symbol.trim();
    let loaded = load_bars(symbol, provider, &load_options(config))?;

    let pipeline_config = config.pipeline_config();
    let output = run_pipeline(&loaded.series, &pipeline_config)?;
    let fingerprint = RunFingerprint::compute(
        symbol,
        &loaded.series,
        &pipeline_config.macd,
        pipeline_config.initial_position,
        &pipeline_config.backtest,
    );
    let summary = RunSummary::from_output(&output);

    info!(
        symbol,
        run = fingerprint.short(),
        bars = summary.bars,
        buys = summary.buys,
        sells = summary.sells,
        total_return = summary.total_return,
        profit_percentage = summary.profit_percentage,
        "run complete"
    );

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        source: loaded.source,
        config: pipeline_config,
        fingerprint,
        summary,
        output,
    })
}

fn load_options(config: &RunConfig) -> LoadOptions {
    LoadOptions {
        start: config.run.start_date,
        synthetic_end: config.data.synthetic_end,
    }
}
