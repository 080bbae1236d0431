//! MACD/signal-line crossover detection.
//!
//! Edge-triggered two-state machine: Buy fires on the bar where the MACD line
//! is first above the signal line while not holding, Sell on the bar where it
//! is first below while holding. Bars where the lines are equal never fire
//! and never change state.

use serde::{Deserialize, Serialize};

use crate::domain::TradeSignal;
use crate::error::MacdError;
use crate::indicators::MacdSeries;

/// Holding state tracked by the crossover machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldState {
    Long,
    #[default]
    NotLong,
}

/// Ordering of the MACD line relative to the signal line on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Above,
    Below,
    Equal,
}

impl Crossover {
    /// Compare MACD to signal. Unordered values (NaN) count as `Equal`.
    pub fn classify(macd: f64, signal: f64) -> Self {
        match macd.partial_cmp(&signal) {
            Some(std::cmp::Ordering::Greater) => Crossover::Above,
            Some(std::cmp::Ordering::Less) => Crossover::Below,
            _ => Crossover::Equal,
        }
    }
}

/// Pure transition function of the crossover machine.
pub fn transition(state: HoldState, crossover: Crossover) -> (HoldState, TradeSignal) {
    match (state, crossover) {
        (HoldState::NotLong, Crossover::Above) => (HoldState::Long, TradeSignal::Buy),
        (HoldState::Long, Crossover::Below) => (HoldState::NotLong, TradeSignal::Sell),
        (state, _) => (state, TradeSignal::None),
    }
}

/// Output of the crossover generator, index-aligned with the price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverSignals {
    /// Close price on bars where a Buy fired.
    pub buy_price: Vec<Option<f64>>,
    /// Close price on bars where a Sell fired.
    pub sell_price: Vec<Option<f64>>,
    pub trade_signal: Vec<TradeSignal>,
}

impl CrossoverSignals {
    pub fn len(&self) -> usize {
        self.trade_signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trade_signal.is_empty()
    }

    pub fn buy_count(&self) -> usize {
        self.count(TradeSignal::Buy)
    }

    pub fn sell_count(&self) -> usize {
        self.count(TradeSignal::Sell)
    }

    /// Bar indices where a signal fired, in order.
    pub fn event_indices(&self) -> Vec<usize> {
        self.trade_signal
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_event())
            .map(|(i, _)| i)
            .collect()
    }

    fn count(&self, kind: TradeSignal) -> usize {
        self.trade_signal.iter().filter(|&&s| s == kind).count()
    }
}

/// Run the crossover machine over a MACD series.
///
/// `prices` supplies the marker prices and must be aligned with `macd`.
pub fn generate_signals(
    prices: &[f64],
    macd: &MacdSeries,
) -> Result<CrossoverSignals, MacdError> {
    let n = prices.len();
    MacdError::check_len("macd line", n, macd.macd.len())?;
    MacdError::check_len("signal line", n, macd.signal.len())?;

    let mut buy_price = vec![None; n];
    let mut sell_price = vec![None; n];
    let mut trade_signal = vec![TradeSignal::None; n];

    let mut state = HoldState::NotLong;
    for t in 0..n {
        let crossover = Crossover::classify(macd.macd[t], macd.signal[t]);
        let (next, emitted) = transition(state, crossover);
        match emitted {
            TradeSignal::Buy => buy_price[t] = Some(prices[t]),
            TradeSignal::Sell => sell_price[t] = Some(prices[t]),
            TradeSignal::None => {}
        }
        trade_signal[t] = emitted;
        state = next;
    }

    Ok(CrossoverSignals {
        buy_price,
        sell_price,
        trade_signal,
    })
}
