//! Trade signal: the discrete event emitted on a crossover state change.

use serde::{Deserialize, Serialize};

/// Per-bar trade event.
///
/// `None` is the default and by far the most common value: a signal fires
/// only on the bar where the crossover state changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSignal {
    Buy,
    Sell,
    #[default]
    None,
}

impl TradeSignal {
    /// Numeric encoding: Buy = +1, Sell = -1, None = 0.
    pub fn value(self) -> i8 {
        match self {
            TradeSignal::Buy => 1,
            TradeSignal::Sell => -1,
            TradeSignal::None => 0,
        }
    }

    pub fn is_event(self) -> bool {
        self != TradeSignal::None
    }
}
