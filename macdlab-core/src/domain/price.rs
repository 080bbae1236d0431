//! PriceSeries: the validated, date-ordered close series the pipeline runs on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bar::DailyBar;
use crate::error::MacdError;

/// A single (date, close) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Chronologically ordered close prices.
///
/// Dates are strictly increasing and every close is finite. Spacing between
/// dates is not constrained (weekends and holidays simply do not appear).
/// Once built the series is immutable; the pipeline only borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points, validating order and finiteness.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, MacdError> {
        for (i, p) in points.iter().enumerate() {
            if !p.close.is_finite() {
                return Err(MacdError::degenerate(format!(
                    "close at {} (bar {i}) is not finite: {}",
                    p.date, p.close
                )));
            }
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(MacdError::invalid(format!(
                    "dates must be strictly increasing: bar {} ({}) follows bar {i} ({})",
                    i + 1,
                    pair[1].date,
                    pair[0].date
                )));
            }
        }
        Ok(Self { points })
    }

    /// Build a series from provider bars using the close column.
    pub fn from_bars(bars: &[DailyBar]) -> Result<Self, MacdError> {
        Self::new(
            bars.iter()
                .map(|b| PricePoint {
                    date: b.date,
                    close: b.close,
                })
                .collect(),
        )
    }

    /// Convenience constructor for consecutive calendar days starting at `start`.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, MacdError> {
        Self::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    date: start + chrono::Duration::days(i as i64),
                    close,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn accepts_ordered_finite_points() {
        let series = PriceSeries::from_closes(day(2), &[100.0, 101.0, 99.5]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![100.0, 101.0, 99.5]);
        assert_eq!(series.first().unwrap().date, day(2));
        assert_eq!(series.last().unwrap().date, day(4));
    }

    #[test]
    fn allows_gaps_between_dates() {
        let series = PriceSeries::new(vec![
            PricePoint { date: day(2), close: 1.0 },
            PricePoint { date: day(8), close: 2.0 },
        ]);
        assert!(series.is_ok());
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new(vec![
            PricePoint { date: day(2), close: 1.0 },
            PricePoint { date: day(2), close: 2.0 },
        ])
        .unwrap_err();
        assert!(matches!(err, MacdError::InvalidInput(_)));
    }

    #[test]
    fn rejects_descending_dates() {
        let err = PriceSeries::new(vec![
            PricePoint { date: day(3), close: 1.0 },
            PricePoint { date: day(2), close: 2.0 },
        ])
        .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_nan_close() {
        let err = PriceSeries::from_closes(day(2), &[100.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, MacdError::ArithmeticDegenerate(_)));
    }

    #[test]
    fn empty_series_is_constructible() {
        let series = PriceSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.first().is_none());
    }
}
