//! Price history providers

pub mod alpha_vantage;
pub mod csv_import;
pub mod provider;
pub mod synthetic;

pub use alpha_vantage::{resolve_api_key, AlphaVantageProvider, OutputSize};
pub use csv_import::CsvProvider;
pub use provider::{
    canonicalize, fetch_bars, filter_from, DataError, DataSource, PriceHistoryProvider,
};
pub use synthetic::SyntheticProvider;
