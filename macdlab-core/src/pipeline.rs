//! The four-stage pipeline: MACD → crossover signals → positions → backtest.
//!
//! Data flows strictly forward. Each stage borrows the price series and
//! returns a new owned output; nothing is shared or mutated between stages.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backtest::{simulate, BacktestConfig, BacktestLedger};
use crate::domain::PriceSeries;
use crate::error::MacdError;
use crate::indicators::{macd_with, MacdParams, MacdSeries};
use crate::positions::{InitialPosition, PositionTable};
use crate::signals::{generate_signals, CrossoverSignals};

/// Settings for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub macd: MacdParams,
    pub initial_position: InitialPosition,
    pub backtest: BacktestConfig,
}

impl PipelineConfig {
    pub fn new(investment: f64) -> Self {
        Self {
            macd: MacdParams::default(),
            initial_position: InitialPosition::default(),
            backtest: BacktestConfig::new(investment),
        }
    }
}

/// Every intermediate series plus the backtest ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub macd: MacdSeries,
    pub signals: CrossoverSignals,
    pub table: PositionTable,
    pub ledger: BacktestLedger,
}

/// Run all four stages over `series`.
pub fn run_pipeline(
    series: &PriceSeries,
    config: &PipelineConfig,
) -> Result<PipelineOutput, MacdError> {
    config.backtest.validate()?;
    let closes = series.closes();

    let macd = macd_with(&closes, config.macd)?;
    debug!(bars = macd.len(), params = ?config.macd, "computed MACD");

    let signals = generate_signals(&closes, &macd)?;
    debug!(
        buys = signals.buy_count(),
        sells = signals.sell_count(),
        "generated crossover signals"
    );

    let table = PositionTable::build(series, &macd, &signals, config.initial_position)?;
    debug!(
        in_market = table.bars_in_market(),
        seed = ?config.initial_position,
        "built position track"
    );

    let ledger = simulate(&closes, &table.positions(), &config.backtest)?;

    Ok(PipelineOutput {
        macd,
        signals,
        table,
        ledger,
    })
}
