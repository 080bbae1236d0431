//! MACDLab Runner: run orchestration on top of `macdlab-core`.
//!
//! This crate provides:
//! - TOML run configuration with validation
//! - Data loading from Alpha Vantage, CSV or synthetic providers
//! - Single-run orchestration with fingerprinting
//! - Summary metrics (round trips, exposure, buy-and-hold, drawdown)
//! - Plain-text report rendering

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod report;
pub mod runner;

pub use config::{BacktestSection, ConfigError, DataSection, RunConfig, RunSection, SourceKind};
pub use data_loader::{build_provider, load_bars, LoadError, LoadOptions, LoadedData};
pub use metrics::{RoundTrip, RunSummary};
pub use report::{format_macd_tail, format_position_tail, format_summary, DEFAULT_TAIL};
pub use runner::{run, run_with_provider, RunError, RunReport, SCHEMA_VERSION};
