//! Price history loading for the runner.
//!
//! Resolves the configured provider, fetches bars for one symbol, applies
//! the start-date filter and converts the closes into a `PriceSeries`.
//! Synthetic data is a developer-only mode; its provenance is carried
//! through to the report so it is never mistaken for market data.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use macdlab_core::data::{
    fetch_bars, filter_from, resolve_api_key, AlphaVantageProvider, CsvProvider, DataError,
    DataSource, PriceHistoryProvider, SyntheticProvider,
};
use macdlab_core::domain::{DailyBar, PriceSeries};
use macdlab_core::MacdError;

use crate::config::{DataSection, SourceKind};

/// Synthetic walks start this many days before the end date.
const SYNTHETIC_LOOKBACK_DAYS: i64 = 365 * 2;

/// Errors from the data loading layer.
///
/// Provider failures arrive as `MacdError::UpstreamData`; price validation
/// failures as the other `MacdError` variants.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Core(#[from] MacdError),

    #[error("no bars for '{symbol}' on or after {start}")]
    EmptyAfterFilter { symbol: String, start: NaiveDate },
}

impl From<DataError> for LoadError {
    fn from(e: DataError) -> Self {
        LoadError::Core(MacdError::UpstreamData(e))
    }
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Keep bars dated on or after this day.
    pub start: Option<NaiveDate>,
    /// Last day of a synthetic walk. `None` means today.
    pub synthetic_end: Option<NaiveDate>,
}

/// Bars loaded for one symbol, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub symbol: String,
    pub source: DataSource,
    /// Bars after the start-date filter.
    pub bars: Vec<DailyBar>,
    pub series: PriceSeries,
    /// Bars dropped by the start-date filter.
    pub filtered_out: usize,
}

impl LoadedData {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Build the provider described by the `[data]` section.
pub fn build_provider(
    data: &DataSection,
    opts: &LoadOptions,
) -> Result<Box<dyn PriceHistoryProvider>, LoadError> {
    let provider: Box<dyn PriceHistoryProvider> = match data.source {
        SourceKind::AlphaVantage => {
            let key = resolve_api_key(data.api_key_file.as_deref())?;
            Box::new(AlphaVantageProvider::new(key, data.output_size)?)
        }
        SourceKind::Csv => {
            let path = data.csv_path.clone().ok_or_else(|| {
                DataError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no CSV path configured",
                ))
            })?;
            Box::new(CsvProvider::new(path))
        }
        SourceKind::Synthetic => {
            let end = opts
                .synthetic_end
                .or(data.synthetic_end)
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            let start = opts
                .start
                .map(|s| s - chrono::Duration::days(60))
                .unwrap_or(end - chrono::Duration::days(SYNTHETIC_LOOKBACK_DAYS));
            Box::new(SyntheticProvider::new(start.min(end), end))
        }
    };
    Ok(provider)
}

/// Fetch, filter and validate bars for `symbol`.
pub fn load_bars(
    symbol: &str,
    provider: &dyn PriceHistoryProvider,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let fetched = fetch_bars(provider, symbol)?;
    let total = fetched.len();
    let bars = filter_from(fetched, opts.start);

    if bars.is_empty() {
        return match opts.start {
            Some(start) => Err(LoadError::EmptyAfterFilter {
                symbol: symbol.to_string(),
                start,
            }),
            None => Err(DataError::Empty {
                symbol: symbol.to_string(),
            }
            .into()),
        };
    }

    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        warn!(symbol, insane, "bars with inconsistent OHLC values");
    }

    let series = PriceSeries::from_bars(&bars)?;
    let source = provider.source();
    info!(
        symbol,
        provider = provider.name(),
        bars = bars.len(),
        filtered_out = total - bars.len(),
        "loaded price history"
    );

    Ok(LoadedData {
        symbol: symbol.to_string(),
        source,
        filtered_out: total - bars.len(),
        bars,
        series,
    })
}
