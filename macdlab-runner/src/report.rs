//! Plain-text rendering of run results.
//!
//! Everything returns a `String` so the CLI decides where it goes.

use std::fmt::{self, Write};

use macdlab_core::positions::PositionRow;

use crate::runner::RunReport;

/// Rows shown by default, matching a dataframe `tail()`.
pub const DEFAULT_TAIL: usize = 5;

/// Date, MACD line, signal line and histogram for each row.
pub fn format_macd_tail(rows: &[PositionRow]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:<12} {:>12} {:>12} {:>12}",
        "Date", "MACD", "Signal", "Hist"
    )?;
    for r in rows {
        writeln!(
            out,
            "{:<12} {:>12.6} {:>12.6} {:>12.6}",
            r.date, r.macd, r.signal, r.histogram
        )?;
    }
    Ok(out)
}

/// Full per-bar table: close, indicators, trade signal and position.
pub fn format_position_tail(rows: &[PositionRow]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:<12} {:>10} {:>11} {:>11} {:>11} {:>6} {:>4}",
        "Date", "Close", "MACD", "Signal", "Hist", "Trade", "Pos"
    )?;
    for r in rows {
        writeln!(
            out,
            "{:<12} {:>10.2} {:>11.4} {:>11.4} {:>11.4} {:>6} {:>4}",
            r.date,
            r.close,
            r.macd,
            r.signal,
            r.histogram,
            r.trade_signal.value(),
            r.position.value()
        )?;
    }
    Ok(out)
}

/// Human-readable run summary.
pub fn format_summary(report: &RunReport) -> Result<String, fmt::Error> {
    let s = &report.summary;
    let investment = report.config.backtest.investment;
    let mut out = String::new();

    writeln!(out, "=== MACD Crossover Backtest ===")?;
    writeln!(out, "Symbol:         {}", report.symbol)?;
    if report.is_synthetic() {
        writeln!(out, "Data:           SYNTHETIC (not market data)")?;
    }
    match (s.first_date, s.last_date) {
        (Some(first), Some(last)) => {
            writeln!(out, "Period:         {first} to {last} ({} bars)", s.bars)?
        }
        _ => writeln!(out, "Period:         (empty)")?,
    }
    let macd = report.config.macd;
    writeln!(
        out,
        "MACD:           slow {} / fast {} / smooth {}",
        macd.slow, macd.fast, macd.smooth
    )?;
    writeln!(out, "Timing:         {:?}", report.config.backtest.timing)?;
    writeln!(out, "Run:            {}", report.fingerprint.short())?;
    writeln!(out)?;
    writeln!(out, "--- Signals ---")?;
    writeln!(out, "Buys:           {}", s.buys)?;
    writeln!(out, "Sells:          {}", s.sells)?;
    writeln!(out, "Round trips:    {}", s.round_trips)?;
    writeln!(out, "Win rate:       {:.1}%", s.win_rate * 100.0)?;
    writeln!(
        out,
        "Exposure:       {:.1}% ({} bars long)",
        s.exposure * 100.0,
        s.bars_in_market
    )?;
    if let Some(h) = s.final_histogram {
        writeln!(out, "Last histogram: {h:.6}")?;
    }
    writeln!(out)?;
    writeln!(out, "--- Backtest ---")?;
    writeln!(out, "Investment:     {investment:.2}")?;
    writeln!(out, "Shares:         {}", s.shares)?;
    writeln!(out, "Max drawdown:   {:.2}%", s.max_drawdown * 100.0)?;
    writeln!(out, "Buy and hold:   {:.2}", s.buy_and_hold_return)?;
    writeln!(
        out,
        "Profit gained from the MACD strategy by investing {} in {} : {}",
        format_investment(investment),
        report.symbol,
        format_money(s.total_return)
    )?;
    writeln!(
        out,
        "Profit percentage of the MACD strategy : {}%",
        s.profit_percentage
    )?;
    Ok(out)
}

/// `$100k` for whole thousands, `$1500.00` otherwise.
fn format_investment(investment: f64) -> String {
    let thousands = investment / 1_000.0;
    if thousands >= 1.0 && thousands.fract() == 0.0 {
        format!("${thousands:.0}k")
    } else {
        format!("${investment:.2}")
    }
}

fn format_money(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use macdlab_core::domain::{Position, TradeSignal};

    fn rows() -> Vec<PositionRow> {
        vec![
            PositionRow {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                close: 101.5,
                macd: 0.25,
                signal: 0.125,
                histogram: 0.125,
                trade_signal: TradeSignal::Buy,
                position: Position::Long,
            },
            PositionRow {
                date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                close: 99.0,
                macd: -0.5,
                signal: 0.0,
                histogram: -0.5,
                trade_signal: TradeSignal::Sell,
                position: Position::Flat,
            },
        ]
    }

    #[test]
    fn macd_tail_has_header_and_one_line_per_row() {
        let text = format_macd_tail(&rows()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[1].starts_with("2024-05-01"));
        assert!(lines[1].contains("0.250000"));
    }

    #[test]
    fn position_tail_shows_signal_values() {
        let text = format_position_tail(&rows()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].trim_end().ends_with('1'));
        assert!(lines[2].contains("-1"));
        assert!(lines[2].trim_end().ends_with('0'));
    }

    #[test]
    fn empty_tail_is_header_only() {
        assert_eq!(format_macd_tail(&[]).unwrap().lines().count(), 1);
    }

    #[test]
    fn money_keeps_one_decimal_for_whole_values() {
        assert_eq!(format_money(700.0), "700.0");
        assert_eq!(format_money(-12.34), "-12.34");
    }

    #[test]
    fn investment_uses_k_only_for_whole_thousands() {
        assert_eq!(format_investment(100_000.0), "$100k");
        assert_eq!(format_investment(10_000.0), "$10k");
        assert_eq!(format_investment(1_500.0), "$1500.00");
        assert_eq!(format_investment(999.99), "$999.99");
    }
}
