//! Synthetic price provider for development and tests.
//!
//! Produces a seeded random walk of weekday bars. The seed is derived from
//! the symbol, so the same symbol and date range always yield the same bars.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::provider::{DataError, DataSource, PriceHistoryProvider};
use crate::domain::DailyBar;

/// Deterministic random-walk bars between two dates (inclusive).
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start: NaiveDate,
    end: NaiveDate,
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            start_price: 100.0,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }
}

impl PriceHistoryProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<DailyBar>, DataError> {
        warn!(symbol, "generating synthetic bars, results are not market data");
        let bars = generate_bars(symbol, self.start, self.end, self.start_price);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }
}

/// Random walk with daily returns in ±3%, skipping weekends.
pub fn generate_bars(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    start_price: f64,
) -> Vec<DailyBar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = start_price;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(DailyBar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
