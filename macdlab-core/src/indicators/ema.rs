//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1)
//! Seed: EMA[0] = x[0]. There is no warm-up gap; every index has a value.

use crate::error::MacdError;

/// Smoothing factor for a span.
pub fn alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// One step of the EMA fold.
///
/// `prev` is the running state (`None` before the first observation). The
/// returned value is both the output for this bar and the next state.
pub fn ema_step(prev: Option<f64>, value: f64, alpha: f64) -> f64 {
    match prev {
        None => value,
        Some(prev) => alpha * value + (1.0 - alpha) * prev,
    }
}

/// Incremental EMA accumulator built on [`ema_step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaState {
    alpha: f64,
    current: Option<f64>,
}

impl EmaState {
    pub fn new(span: usize) -> Result<Self, MacdError> {
        check_span(span)?;
        Ok(Self {
            alpha: alpha(span),
            current: None,
        })
    }

    /// Feed the next observation and return the updated average.
    pub fn next(&mut self, value: f64) -> f64 {
        let ema = ema_step(self.current, value, self.alpha);
        self.current = Some(ema);
        ema
    }

    /// Current average, `None` until the first observation.
    pub fn value(&self) -> Option<f64> {
        self.current
    }
}

/// Compute the EMA of `series` with the given span.
///
/// Output has the same length as the input. NaN values are not rejected here;
/// they propagate into every later value. `PriceSeries` keeps them out of the
/// pipeline.
pub fn compute_ema(series: &[f64], span: usize) -> Result<Vec<f64>, MacdError> {
    check_span(span)?;
    if series.is_empty() {
        return Err(MacdError::invalid("EMA input series is empty"));
    }

    let mut state = EmaState::new(span)?;
    Ok(series.iter().map(|&x| state.next(x)).collect())
}

fn check_span(span: usize) -> Result<(), MacdError> {
    if span == 0 {
        return Err(MacdError::invalid("EMA span must be a positive integer, got 0"));
    }
    Ok(())
}
