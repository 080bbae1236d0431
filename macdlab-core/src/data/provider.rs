//! Price history provider trait and structured error types.
//!
//! The `PriceHistoryProvider` trait abstracts over data sources (Alpha Vantage,
//! CSV import, synthetic) so the runner can swap implementations and tests can
//! run offline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DailyBar;
use crate::error::MacdError;

/// Structured error types for data operations.
///
/// Displayable in CLI output. None of these are retried by the pipeline.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no API key: set ALPHAVANTAGE_API_KEY or provide a key file ({0})")]
    MissingApiKey(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no bars returned for '{symbol}'")]
    Empty { symbol: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    AlphaVantage,
    CsvImport,
    Synthetic,
}

/// Trait for price history providers.
///
/// Implementations return every daily bar they have for `symbol`, sorted
/// ascending by date with no duplicate dates. Any retrying happens inside the
/// provider.
pub trait PriceHistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Which kind of source this provider reads.
    fn source(&self) -> DataSource;

    /// Fetch daily bars for a symbol.
    fn fetch(&self, symbol: &str) -> Result<Vec<DailyBar>, DataError>;
}

/// Keep bars dated on or after `start`. `None` keeps everything.
pub fn filter_from(bars: Vec<DailyBar>, start: Option<NaiveDate>) -> Vec<DailyBar> {
    match start {
        Some(start) => bars.into_iter().filter(|b| b.date >= start).collect(),
        None => bars,
    }
}

/// Fetch bars for `symbol`, surfacing provider failures as `MacdError::UpstreamData`.
pub fn fetch_bars(
    provider: &dyn PriceHistoryProvider,
    symbol: &str,
) -> Result<Vec<DailyBar>, MacdError> {
    Ok(provider.fetch(symbol)?)
}

/// Sort bars ascending by date and reject duplicate dates.
pub fn canonicalize(mut bars: Vec<DailyBar>) -> Result<Vec<DailyBar>, DataError> {
    bars.sort_by_key(|b| b.date);
    if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(DataError::ResponseFormatChanged(format!(
            "duplicate bar for {}",
            pair[0].date
        )));
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(d: u32, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 2, d).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn filter_keeps_start_date_inclusive() {
        let bars = vec![bar(1, 1.0), bar(2, 2.0), bar(3, 3.0)];
        let start = NaiveDate::from_ymd_opt(2024, 2, 2);
        let kept = filter_from(bars, start);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].close, 2.0);
    }

    #[test]
    fn filter_without_start_keeps_all() {
        assert_eq!(filter_from(vec![bar(1, 1.0), bar(2, 2.0)], None).len(), 2);
    }

    #[test]
    fn canonicalize_sorts_descending_input() {
        let bars = canonicalize(vec![bar(3, 3.0), bar(1, 1.0), bar(2, 2.0)]).unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    struct Unreachable;

    impl PriceHistoryProvider for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn source(&self) -> DataSource {
            DataSource::AlphaVantage
        }

        fn fetch(&self, _symbol: &str) -> Result<Vec<DailyBar>, DataError> {
            Err(DataError::NetworkUnreachable("connection refused".into()))
        }
    }

    #[test]
    fn fetch_failure_is_upstream_data_error() {
        let err = fetch_bars(&Unreachable, "IBM").unwrap_err();
        assert!(matches!(
            err,
            MacdError::UpstreamData(DataError::NetworkUnreachable(_))
        ));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn canonicalize_rejects_duplicates() {
        let err = canonicalize(vec![bar(1, 1.0), bar(1, 1.5)]).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }
}
