//! MACDLab Core: price series, MACD, crossover signals, positions, backtest.
//!
//! This crate contains the numeric pipeline and its inputs:
//! - Domain types (daily bars, price series, trade signals, positions)
//! - EMA as an explicit fold and the MACD/signal/histogram calculator
//! - Edge-triggered crossover state machine
//! - Carry-forward position builder with an explicit seed
//! - Fixed-share backtest simulator with selectable position timing
//! - Price history providers (Alpha Vantage, CSV, synthetic)

pub mod backtest;
pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod pipeline;
pub mod positions;
pub mod signals;

pub use backtest::{simulate, BacktestConfig, BacktestLedger, PositionTiming};
pub use error::MacdError;
pub use fingerprint::RunFingerprint;
pub use indicators::{compute_ema, compute_macd, MacdParams, MacdSeries};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
pub use positions::{build_positions, InitialPosition, PositionTable};
pub use signals::{generate_signals, CrossoverSignals};
