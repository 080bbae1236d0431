//! Moving Average Convergence/Divergence.
//!
//! macd[t]      = EMA(price, fast)[t] - EMA(price, slow)[t]
//! signal[t]    = EMA(macd, smooth)[t]
//! histogram[t] = macd[t] - signal[t]
//!
//! All three series are index-aligned with the input price series.

use serde::{Deserialize, Serialize};

use super::ema::compute_ema;
use crate::error::MacdError;

/// The three MACD spans.
///
/// No ordering is enforced between `fast` and `slow`; the conventional setup
/// has `fast < slow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub slow: usize,
    pub fast: usize,
    pub smooth: usize,
}

impl MacdParams {
    pub fn new(slow: usize, fast: usize, smooth: usize) -> Self {
        Self { slow, fast, smooth }
    }

    pub fn validate(&self) -> Result<(), MacdError> {
        for (name, span) in [
            ("slow", self.slow),
            ("fast", self.fast),
            ("smooth", self.smooth),
        ] {
            if span == 0 {
                return Err(MacdError::invalid(format!(
                    "MACD {name} span must be a positive integer, got 0"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MacdParams {
    /// Classic 26/12/9 configuration.
    fn default() -> Self {
        Self::new(26, 12, 9)
    }
}

/// MACD line, signal line and histogram, one value per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// (macd, signal, histogram) at one bar.
    pub fn at(&self, bar_index: usize) -> Option<(f64, f64, f64)> {
        Some((
            *self.macd.get(bar_index)?,
            *self.signal.get(bar_index)?,
            *self.histogram.get(bar_index)?,
        ))
    }
}

/// Compute MACD with explicit spans, argument order as (slow, fast, smooth).
pub fn compute_macd(
    price: &[f64],
    slow: usize,
    fast: usize,
    smooth: usize,
) -> Result<MacdSeries, MacdError> {
    macd_with(price, MacdParams::new(slow, fast, smooth))
}

/// Compute MACD from a parameter set.
pub fn macd_with(price: &[f64], params: MacdParams) -> Result<MacdSeries, MacdError> {
    params.validate()?;
    if price.is_empty() {
        return Err(MacdError::invalid("price series is empty"));
    }

    let fast_ema = compute_ema(price, params.fast)?;
    let slow_ema = compute_ema(price, params.slow)?;
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = compute_ema(&macd, params.smooth)?;
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    Ok(MacdSeries {
        macd,
        signal,
        histogram,
    })
}
