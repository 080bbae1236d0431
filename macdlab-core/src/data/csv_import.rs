//! CSV import provider for offline runs.
//!
//! Expects a header row with `date` (or `timestamp`, as in Alpha Vantage CSV
//! downloads), `open`, `high`, `low`, `close`, `volume`. Dates are
//! `YYYY-MM-DD`; rows may be in any order.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::provider::{canonicalize, DataError, DataSource, PriceHistoryProvider};
use crate::domain::DailyBar;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "timestamp")]
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Reads bars for one symbol from a CSV file.
///
/// The symbol passed to `fetch` is only used in error messages; the file is
/// assumed to hold that symbol's history.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceHistoryProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<DailyBar>, DataError> {
        let file = std::fs::File::open(&self.path)?;
        let bars = read_bars(symbol, file)?;
        info!(symbol, path = %self.path.display(), bars = bars.len(), "loaded bars from CSV");
        Ok(bars)
    }
}

/// Parse CSV bars from any reader.
pub fn read_bars<R: Read>(symbol: &str, reader: R) -> Result<Vec<DailyBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for row in rdr.deserialize() {
        let row: CsvRow = row?;
        bars.push(DailyBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    if bars.is_empty() {
        return Err(DataError::Empty {
            symbol: symbol.to_string(),
        });
    }
    canonicalize(bars)
}
