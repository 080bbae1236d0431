//! Position construction: carry trade events forward into a dense holding track.
//!
//! position[t] = Long on a Buy bar, Flat on a Sell bar, position[t-1] otherwise.
//! Bar 0 has no predecessor; the fold is seeded with an explicit
//! [`InitialPosition`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Position, PriceSeries, TradeSignal};
use crate::error::MacdError;
use crate::indicators::MacdSeries;
use crate::signals::CrossoverSignals;

/// Holding state assumed before the first bar.
///
/// Only matters when bar 0 carries no trade signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialPosition {
    #[default]
    Flat,
    Long,
}

impl From<InitialPosition> for Position {
    fn from(seed: InitialPosition) -> Self {
        match seed {
            InitialPosition::Flat => Position::Flat,
            InitialPosition::Long => Position::Long,
        }
    }
}

/// Carry-forward step: the position after observing `signal` while holding `prev`.
pub fn carry(prev: Position, signal: TradeSignal) -> Position {
    match signal {
        TradeSignal::Buy => Position::Long,
        TradeSignal::Sell => Position::Flat,
        TradeSignal::None => prev,
    }
}

/// Fold a trade-signal sequence into a position track.
pub fn build_positions(signals: &[TradeSignal], initial: InitialPosition) -> Vec<Position> {
    signals
        .iter()
        .scan(Position::from(initial), |held, &signal| {
            *held = carry(*held, signal);
            Some(*held)
        })
        .collect()
}

/// One bar of the aligned pipeline table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub date: NaiveDate,
    pub close: f64,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub trade_signal: TradeSignal,
    pub position: Position,
}

/// Close, MACD, signal, histogram, trade signal and position keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionTable {
    rows: Vec<PositionRow>,
}

impl PositionTable {
    /// Join the pipeline outputs into one table.
    ///
    /// Every input must have exactly one value per price bar.
    pub fn build(
        prices: &PriceSeries,
        macd: &MacdSeries,
        signals: &CrossoverSignals,
        initial: InitialPosition,
    ) -> Result<Self, MacdError> {
        let n = prices.len();
        MacdError::check_len("macd line", n, macd.macd.len())?;
        MacdError::check_len("signal line", n, macd.signal.len())?;
        MacdError::check_len("histogram", n, macd.histogram.len())?;
        MacdError::check_len("trade signal", n, signals.trade_signal.len())?;

        let positions = build_positions(&signals.trade_signal, initial);
        let rows = prices
            .points()
            .iter()
            .enumerate()
            .map(|(t, p)| PositionRow {
                date: p.date,
                close: p.close,
                macd: macd.macd[t],
                signal: macd.signal[t],
                histogram: macd.histogram[t],
                trade_signal: signals.trade_signal[t],
                position: positions[t],
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[PositionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.rows.iter().map(|r| r.position).collect()
    }

    /// Last `n` rows (fewer if the table is shorter).
    pub fn tail(&self, n: usize) -> &[PositionRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    /// Number of bars spent long.
    pub fn bars_in_market(&self) -> usize {
        self.rows.iter().filter(|r| r.position.is_long()).count()
    }
}
