//! Alpha Vantage data provider.
//!
//! Fetches daily OHLCV bars from the `TIME_SERIES_DAILY` endpoint. The API
//! reports problems inside a 200 response body (`Error Message`, `Note`,
//! `Information`), so the body is classified before the series is parsed.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::provider::{canonicalize, DataError, DataSource, PriceHistoryProvider};
use crate::domain::DailyBar;

/// Environment variable checked before any key file.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// Key file read when the environment variable is unset.
pub const DEFAULT_KEY_FILE: &str = "api_key.txt";

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// How much history to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSize {
    /// Latest 100 bars.
    #[default]
    Compact,
    /// Full history (20+ years where available).
    Full,
}

impl OutputSize {
    fn as_param(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Resolve the API key: environment variable first, then the key file.
pub fn resolve_api_key(key_file: Option<&Path>) -> Result<String, DataError> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let path = key_file.unwrap_or_else(|| Path::new(DEFAULT_KEY_FILE));
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DataError::MissingApiKey(format!("{}: {e}", path.display())))?;
    let key = contents.trim();
    if key.is_empty() {
        return Err(DataError::MissingApiKey(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

/// `TIME_SERIES_DAILY` response body.
#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyEntry>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Alpha Vantage data provider.
pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    output_size: OutputSize,
    max_retries: u32,
    base_delay: Duration,
}

impl AlphaVantageProvider {
    pub fn new(api_key: impl Into<String>, output_size: OutputSize) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            output_size,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// GET request for a symbol; reqwest percent-encodes every parameter.
    fn request(&self, symbol: &str) -> reqwest::blocking::RequestBuilder {
        self.client.get(BASE_URL).query(&[
            ("function", "TIME_SERIES_DAILY"),
            ("symbol", symbol),
            ("outputsize", self.output_size.as_param()),
            ("apikey", self.api_key.as_str()),
        ])
    }

    /// Execute the request, retrying transport failures with exponential backoff.
    fn fetch_body(&self, symbol: &str) -> Result<String, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(symbol, attempt, ?delay, "retrying Alpha Vantage request");
                std::thread::sleep(delay);
            }

            match self.request(symbol).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(DataError::RateLimited(format!("HTTP {status}")));
                    }
                    if !status.is_success() {
                        last_error = Some(DataError::NetworkUnreachable(format!(
                            "HTTP {status} for {symbol}"
                        )));
                        continue;
                    }
                    return resp
                        .text()
                        .map_err(|e| DataError::NetworkUnreachable(e.to_string()));
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::NetworkUnreachable("max retries exceeded".into())))
    }
}

impl PriceHistoryProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn source(&self) -> DataSource {
        DataSource::AlphaVantage
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<DailyBar>, DataError> {
        info!(symbol, output_size = ?self.output_size, "fetching daily series from Alpha Vantage");
        let body = self.fetch_body(symbol)?;
        let bars = parse_daily_response(symbol, &body)?;
        info!(symbol, bars = bars.len(), "received daily bars");
        Ok(bars)
    }
}

/// Parse a `TIME_SERIES_DAILY` JSON body into ascending daily bars.
pub fn parse_daily_response(symbol: &str, body: &str) -> Result<Vec<DailyBar>, DataError> {
    let resp: DailyResponse = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("invalid JSON for {symbol}: {e}")))?;

    let series = match resp.time_series {
        Some(series) => series,
        None => {
            if resp.error_message.is_some() {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            if let Some(msg) = resp.note.or(resp.information) {
                return Err(DataError::RateLimited(msg));
            }
            return Err(DataError::ResponseFormatChanged(
                "missing \"Time Series (Daily)\"".into(),
            ));
        }
    };

    let mut bars = Vec::with_capacity(series.len());
    for (date, entry) in series {
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
            DataError::ResponseFormatChanged(format!("unparsable date '{date}': {e}"))
        })?;
        bars.push(DailyBar {
            date,
            open: parse_field(date, "open", &entry.open)?,
            high: parse_field(date, "high", &entry.high)?,
            low: parse_field(date, "low", &entry.low)?,
            close: parse_field(date, "close", &entry.close)?,
            volume: parse_field(date, "volume", &entry.volume)?,
        });
    }

    if bars.is_empty() {
        return Err(DataError::Empty {
            symbol: symbol.to_string(),
        });
    }

    canonicalize(bars)
}

fn parse_field(date: NaiveDate, field: &str, raw: &str) -> Result<f64, DataError> {
    raw.trim().parse::<f64>().map_err(|e| {
        DataError::ResponseFormatChanged(format!("bad {field} '{raw}' on {date}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Meta Data": {
            "1. Information": "Daily Prices (open, high, low, close) and Volumes",
            "2. Symbol": "IBM",
            "3. Last Refreshed": "2024-01-04",
            "4. Output Size": "Compact",
            "5. Time Zone": "US/Eastern"
        },
        "Time Series (Daily)": {
            "2024-01-04": {
                "1. open": "161.0000",
                "2. high": "161.9400",
                "3. low": "160.4300",
                "4. close": "161.1000",
                "5. volume": "3960000"
            },
            "2024-01-03": {
                "1. open": "161.0000",
                "2. high": "161.7300",
                "3. low": "160.0800",
                "4. close": "160.1000",
                "5. volume": "4086000"
            },
            "2024-01-02": {
                "1. open": "162.8300",
                "2. high": "163.2900",
                "3. low": "160.0000",
                "4. close": "161.5000",
                "5. volume": "4007000"
            }
        }
    }"#;

    #[test]
    fn parses_and_sorts_ascending() {
        let bars = parse_daily_response("IBM", SAMPLE).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 161.5);
        assert_eq!(bars[2].close, 161.1);
        assert_eq!(bars[1].volume, 4_086_000.0);
        assert!(bars.iter().all(DailyBar::is_sane));
    }

    #[test]
    fn error_message_means_unknown_symbol() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        let err = parse_daily_response("NOPE", body).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOPE"));
    }

    #[test]
    fn note_means_rate_limited() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        let err = parse_daily_response("IBM", body).unwrap_err();
        assert!(matches!(err, DataError::RateLimited(msg) if msg.contains("frequency")));
    }

    #[test]
    fn information_means_rate_limited() {
        let body = r#"{"Information": "We have detected your API key as demo."}"#;
        assert!(matches!(
            parse_daily_response("IBM", body),
            Err(DataError::RateLimited(_))
        ));
    }

    #[test]
    fn unparsable_number_is_format_change() {
        let body = SAMPLE.replace("160.1000", "n/a");
        let err = parse_daily_response("IBM", &body).unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn unparsable_date_is_format_change() {
        let body = SAMPLE.replace("2024-01-03", "Jan 3");
        let err = parse_daily_response("IBM", &body).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn empty_series_is_empty_error() {
        let err = parse_daily_response("IBM", r#"{"Time Series (Daily)": {}}"#).unwrap_err();
        assert!(matches!(err, DataError::Empty { .. }));
    }

    #[test]
    fn missing_entry_field_is_format_change() {
        let body = r#"{"Time Series (Daily)": {"2024-01-02": {"1. open": "1"}}}"#;
        assert!(matches!(
            parse_daily_response("IBM", body),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn key_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");
        std::fs::write(&path, "  ABC123\n").unwrap();
        // The environment variable takes precedence when set; only assert the
        // file path when it is absent.
        if std::env::var(API_KEY_ENV).is_err() {
            assert_eq!(resolve_api_key(Some(&path)).unwrap(), "ABC123");
        }
    }

    #[test]
    fn missing_key_file_is_reported() {
        if std::env::var(API_KEY_ENV).is_err() {
            let err = resolve_api_key(Some(Path::new("/nonexistent/key.txt"))).unwrap_err();
            assert!(matches!(err, DataError::MissingApiKey(_)));
        }
    }

    fn query_of(provider: &AlphaVantageProvider, symbol: &str) -> Vec<(String, String)> {
        let request = provider.request(symbol).build().unwrap();
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn request_includes_output_size() {
        let provider = AlphaVantageProvider::new("KEY", OutputSize::Full).unwrap();
        let query = query_of(&provider, "IBM");
        let get = |k: &str| query.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("function"), Some("TIME_SERIES_DAILY"));
        assert_eq!(get("symbol"), Some("IBM"));
        assert_eq!(get("outputsize"), Some("full"));
        assert_eq!(get("apikey"), Some("KEY"));
    }

    #[test]
    fn request_encodes_symbol_and_key() {
        let provider = AlphaVantageProvider::new("a&b=c", OutputSize::Compact).unwrap();
        let request = provider.request("BRK B&x=1").build().unwrap();
        let url = request.url().as_str().to_string();
        assert!(url.starts_with(BASE_URL));
        assert!(!url.contains("&x=1"));

        let query = query_of(&provider, "BRK B&x=1");
        assert_eq!(query.len(), 4);
        assert!(query.contains(&("symbol".to_string(), "BRK B&x=1".to_string())));
        assert!(query.contains(&("apikey".to_string(), "a&b=c".to_string())));
    }
}
