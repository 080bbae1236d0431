//! Backtest simulation: realized return of following a position track.
//!
//! A whole number of shares is bought with the investment at the first close
//! and held fixed for the run (no rebalancing, no compounding). Each bar's
//! price delta is multiplied by the position in effect and by the share count.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::Position;
use crate::error::MacdError;

/// Which position is paired with the price delta from bar t-1 to bar t.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionTiming {
    /// Position held at t-1, known before the move is realized.
    #[default]
    PriorBar,
    /// Position at t, the bar the delta ends on. Reproduces the classic
    /// pandas formulation but uses information from the end of the move.
    SameBar,
}

/// Backtest parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Cash budget used to size the fixed share count.
    pub investment: f64,
    #[serde(default)]
    pub timing: PositionTiming,
}

impl BacktestConfig {
    pub fn new(investment: f64) -> Self {
        Self {
            investment,
            timing: PositionTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: PositionTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn validate(&self) -> Result<(), MacdError> {
        if !self.investment.is_finite() || self.investment <= 0.0 {
            return Err(MacdError::invalid(format!(
                "investment amount must be a positive number, got {}",
                self.investment
            )));
        }
        Ok(())
    }
}

/// Result of one backtest run.
///
/// `deltas[i]`, `strategy_returns[i]` and `investment_returns[i]` belong to
/// bar `i + 1`; bar 0 has no delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestLedger {
    pub investment: f64,
    pub timing: PositionTiming,
    pub shares: u64,
    /// Number of bars the simulation covered after any truncation.
    pub bars_used: usize,
    pub deltas: Vec<f64>,
    pub strategy_returns: Vec<f64>,
    pub investment_returns: Vec<f64>,
    /// Sum of investment returns rounded to cents.
    pub total_return: f64,
    /// Total return as a whole percentage of the investment, truncated toward zero.
    pub profit_percentage: i64,
}

/// Round to two decimal places. Never returns negative zero.
pub fn round_cents(value: f64) -> f64 {
    // -0.0 + 0.0 == +0.0
    (value * 100.0).round() / 100.0 + 0.0
}

/// Shares affordable at `first_price`, rounded down.
pub fn share_count(investment: f64, first_price: f64) -> Result<u64, MacdError> {
    if !first_price.is_finite() || first_price <= 0.0 {
        return Err(MacdError::degenerate(format!(
            "initial price must be positive to size the position, got {first_price}"
        )));
    }
    Ok((investment / first_price).floor() as u64)
}

/// Simulate the strategy over `prices` following `positions`.
///
/// A position track of a different length is truncated (or the prices are)
/// to the shorter of the two; the run then covers only that prefix.
pub fn simulate(
    prices: &[f64],
    positions: &[Position],
    config: &BacktestConfig,
) -> Result<BacktestLedger, MacdError> {
    config.validate()?;

    if let Some((i, p)) = prices.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(MacdError::degenerate(format!(
            "price at bar {i} is not finite: {p}"
        )));
    }

    let bars_used = prices.len().min(positions.len());
    if bars_used != prices.len() || bars_used != positions.len() {
        warn!(
            prices = prices.len(),
            positions = positions.len(),
            bars_used,
            "price and position lengths differ, truncating backtest"
        );
    }
    let prices = &prices[..bars_used];
    let positions = &positions[..bars_used];

    let shares = match prices.first() {
        Some(&first) => share_count(config.investment, first)?,
        None => 0,
    };

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let mut strategy_returns = Vec::with_capacity(deltas.len());
    for (i, delta) in deltas.iter().enumerate() {
        let t = i + 1;
        let k = match config.timing {
            PositionTiming::PriorBar => t - 1,
            PositionTiming::SameBar => t,
        };
        let held = positions.get(k).copied().ok_or(MacdError::Misaligned {
            what: "position track",
            expected: t + 1,
            actual: positions.len(),
        })?;
        strategy_returns.push(delta * held.exposure());
    }

    let shares_f = shares as f64;
    let investment_returns: Vec<f64> = strategy_returns.iter().map(|r| shares_f * r).collect();
    let total_return = round_cents(investment_returns.iter().sum());
    let profit_percentage = (total_return / config.investment * 100.0).trunc() as i64;

    debug!(
        bars_used,
        shares,
        total_return,
        profit_percentage,
        timing = ?config.timing,
        "backtest complete"
    );

    Ok(BacktestLedger {
        investment: config.investment,
        timing: config.timing,
        shares,
        bars_used,
        deltas,
        strategy_returns,
        investment_returns,
        total_return,
        profit_percentage,
    })
}
