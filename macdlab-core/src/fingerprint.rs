//! Run fingerprinting: deterministic identification of a pipeline run.
//!
//! Two runs with the same symbol, price data, MACD spans, position seed and
//! backtest settings produce the same fingerprint, so their outputs must be
//! bit-identical.

use serde::{Deserialize, Serialize};

use crate::backtest::{BacktestConfig, PositionTiming};
use crate::domain::PriceSeries;
use crate::indicators::MacdParams;
use crate::positions::InitialPosition;

/// BLAKE3 hashes identifying a run and the data it ran on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint {
    /// Hash over dates and closes only.
    pub dataset_hash: String,
    /// Hash over the dataset hash plus every run parameter.
    pub run_hash: String,
}

impl RunFingerprint {
    pub fn compute(
        symbol: &str,
        series: &PriceSeries,
        params: &MacdParams,
        initial: InitialPosition,
        backtest: &BacktestConfig,
    ) -> Self {
        let dataset_hash = dataset_hash(series);

        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(dataset_hash.as_bytes());
        for span in [params.slow, params.fast, params.smooth] {
            hasher.update(&(span as u64).to_le_bytes());
        }
        hasher.update(&[match initial {
            InitialPosition::Flat => 0,
            InitialPosition::Long => 1,
        }]);
        hasher.update(&backtest.investment.to_le_bytes());
        hasher.update(&[match backtest.timing {
            PositionTiming::PriorBar => 0,
            PositionTiming::SameBar => 1,
        }]);

        Self {
            dataset_hash,
            run_hash: hasher.finalize().to_hex().to_string(),
        }
    }

    /// First 12 hex characters of the run hash, for display.
    pub fn short(&self) -> &str {
        &self.run_hash[..12.min(self.run_hash.len())]
    }
}

/// Deterministic BLAKE3 hash over every (date, close) pair.
pub fn dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for point in series.points() {
        hasher.update(point.date.to_string().as_bytes());
        hasher.update(&point.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
