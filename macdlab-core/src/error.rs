//! Core error type shared by the four pipeline stages.

use thiserror::Error;

use crate::data::DataError;

/// Errors raised by the core pipeline.
///
/// Every stage fails fast with one of these; nothing is retried or skipped.
#[derive(Debug, Error)]
pub enum MacdError {
    /// A caller-supplied precondition was violated (empty series, zero span,
    /// non-positive investment, unordered dates).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The price history provider failed or returned unusable data.
    #[error("upstream data error: {0}")]
    UpstreamData(#[from] DataError),

    /// A computation would divide by zero or consume non-finite values.
    #[error("arithmetic degenerate: {0}")]
    ArithmeticDegenerate(String),

    /// Two per-bar sequences that must share one index space differ in length.
    #[error("misaligned series: {what} has {actual} values, expected {expected}")]
    Misaligned {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl MacdError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        MacdError::InvalidInput(reason.into())
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        MacdError::ArithmeticDegenerate(reason.into())
    }

    /// Check that `actual` matches `expected`, naming the offending series.
    pub(crate) fn check_len(
        what: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), MacdError> {
        if expected == actual {
            Ok(())
        } else {
            Err(MacdError::Misaligned {
                what,
                expected,
                actual,
            })
        }
    }
}
