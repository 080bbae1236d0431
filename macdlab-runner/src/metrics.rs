//! Summary metrics: pure functions over a finished pipeline run.
//!
//! Nothing here feeds back into the pipeline. Every figure is derived from
//! the position table and backtest ledger after the fact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use macdlab_core::backtest::{round_cents, BacktestLedger};
use macdlab_core::domain::TradeSignal;
use macdlab_core::pipeline::PipelineOutput;
use macdlab_core::positions::PositionRow;

/// One Buy→Sell cycle read off the signal column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// `None` while the position is still open at the last bar.
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
}

impl RoundTrip {
    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// Fractional price change from entry to exit; `None` while open.
    pub fn return_pct(&self) -> Option<f64> {
        let exit = self.exit_price?;
        if self.entry_price == 0.0 {
            return None;
        }
        Some((exit - self.entry_price) / self.entry_price)
    }
}

/// Reporting figures for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub bars: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub buys: usize,
    pub sells: usize,
    /// Closed Buy→Sell cycles.
    pub round_trips: usize,
    pub win_rate: f64,
    pub bars_in_market: usize,
    /// Fraction of bars held Long.
    pub exposure: f64,
    pub shares: u64,
    pub total_return: f64,
    pub profit_percentage: i64,
    /// `shares · (last close − first close)`, rounded to cents.
    pub buy_and_hold_return: f64,
    /// Largest peak-to-trough fall of the strategy equity curve, as a negative fraction.
    pub max_drawdown: f64,
    pub final_histogram: Option<f64>,
    pub trades: Vec<RoundTrip>,
}

impl RunSummary {
    pub fn from_output(output: &PipelineOutput) -> Self {
        let rows = output.table.rows();
        let trades = round_trips(rows);
        let bars_in_market = output.table.bars_in_market();

        Self {
            bars: rows.len(),
            first_date: rows.first().map(|r| r.date),
            last_date: rows.last().map(|r| r.date),
            buys: output.signals.buy_count(),
            sells: output.signals.sell_count(),
            round_trips: trades.iter().filter(|t| t.is_closed()).count(),
            win_rate: win_rate(&trades),
            bars_in_market,
            exposure: exposure(bars_in_market, rows.len()),
            shares: output.ledger.shares,
            total_return: output.ledger.total_return,
            profit_percentage: output.ledger.profit_percentage,
            buy_and_hold_return: buy_and_hold_return(rows, &output.ledger),
            max_drawdown: max_drawdown(&equity_curve(&output.ledger)),
            final_histogram: output.macd.histogram.last().copied(),
            trades,
        }
    }
}

/// Pair each Buy with the next Sell. A trailing Buy stays open.
pub fn round_trips(rows: &[PositionRow]) -> Vec<RoundTrip> {
    let mut trips = Vec::new();
    let mut open: Option<RoundTrip> = None;

    for row in rows {
        match row.trade_signal {
            TradeSignal::Buy => {
                open = Some(RoundTrip {
                    entry_date: row.date,
                    entry_price: row.close,
                    exit_date: None,
                    exit_price: None,
                });
            }
            TradeSignal::Sell => {
                if let Some(mut trip) = open.take() {
                    trip.exit_date = Some(row.date);
                    trip.exit_price = Some(row.close);
                    trips.push(trip);
                }
            }
            TradeSignal::None => {}
        }
    }

    trips.extend(open);
    trips
}

/// Fraction of closed round trips with a positive return.
pub fn win_rate(trades: &[RoundTrip]) -> f64 {
    let closed: Vec<f64> = trades.iter().filter_map(RoundTrip::return_pct).collect();
    if closed.is_empty() {
        return 0.0;
    }
    closed.iter().filter(|&&r| r > 0.0).count() as f64 / closed.len() as f64
}

pub fn exposure(bars_in_market: usize, bars: usize) -> f64 {
    if bars == 0 {
        return 0.0;
    }
    bars_in_market as f64 / bars as f64
}

/// Holding the same share count for every simulated bar.
pub fn buy_and_hold_return(rows: &[PositionRow], ledger: &BacktestLedger) -> f64 {
    let used = &rows[..ledger.bars_used.min(rows.len())];
    match (used.first(), used.last()) {
        (Some(first), Some(last)) => round_cents(ledger.shares as f64 * (last.close - first.close)),
        _ => 0.0,
    }
}

/// Investment plus cumulative strategy P&L, one point per simulated bar.
pub fn equity_curve(ledger: &BacktestLedger) -> Vec<f64> {
    if ledger.bars_used == 0 {
        return Vec::new();
    }
    let mut curve = Vec::with_capacity(ledger.investment_returns.len() + 1);
    let mut equity = ledger.investment;
    curve.push(equity);
    for r in &ledger.investment_returns {
        equity += r;
        curve.push(equity);
    }
    curve
}

/// Maximum drawdown as a negative fraction of the running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
