//! MACDLab CLI: MACD crossover backtests from the command line.
//!
//! Commands:
//! - `run`: compute MACD, crossover signals and positions, then backtest
//! - `macd`: print only the trailing MACD/signal/histogram rows
//!
//! Symbol, start date and investment not given as flags or in a config file
//! are prompted for on stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use macdlab_core::backtest::PositionTiming;
use macdlab_core::positions::InitialPosition;
use macdlab_runner::{
    format_macd_tail, format_position_tail, format_summary, run, RunConfig, RunReport,
    SourceKind, DEFAULT_TAIL,
};

#[derive(Parser)]
#[command(
    name = "macdlab",
    about = "MACDLab CLI: MACD crossover signals and backtests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the backtest summary.
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// Print the full report as JSON on stdout instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the trailing MACD, signal and histogram rows only.
    Macd {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Path to a TOML run config. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker symbol (e.g., IBM).
    #[arg(long)]
    symbol: Option<String>,

    /// Keep bars on or after this date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// Amount invested at the first bar's close.
    #[arg(long)]
    investment: Option<f64>,

    /// Price history source.
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// CSV file with date,open,high,low,close,volume rows (with --source csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// File holding the Alpha Vantage API key.
    #[arg(long)]
    api_key_file: Option<PathBuf>,

    /// Slow EMA span.
    #[arg(long)]
    slow: Option<usize>,

    /// Fast EMA span.
    #[arg(long)]
    fast: Option<usize>,

    /// Signal line span.
    #[arg(long)]
    smooth: Option<usize>,

    /// Which bar's position earns each price change.
    #[arg(long, value_enum)]
    timing: Option<TimingArg>,

    /// Start the position track long instead of flat.
    #[arg(long, default_value_t = false)]
    start_long: bool,

    /// Number of trailing rows to print.
    #[arg(long, default_value_t = DEFAULT_TAIL)]
    tail: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    AlphaVantage,
    Csv,
    Synthetic,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::AlphaVantage => SourceKind::AlphaVantage,
            SourceArg::Csv => SourceKind::Csv,
            SourceArg::Synthetic => SourceKind::Synthetic,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TimingArg {
    PriorBar,
    SameBar,
}

impl From<TimingArg> for PositionTiming {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::PriorBar => PositionTiming::PriorBar,
            TimingArg::SameBar => PositionTiming::SameBar,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { common, json } => {
            let tail = common.tail;
            let report = execute(common)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", format_position_tail(report.output.table.tail(tail))?);
                println!();
                print!("{}", format_summary(&report)?);
            }
            Ok(())
        }
        Commands::Macd { common } => {
            let tail = common.tail;
            let report = execute(common)?;
            print!("{}", format_macd_tail(report.output.table.tail(tail))?);
            Ok(())
        }
    }
}

/// Logs go to stderr so `--json` output stays clean. `RUST_LOG` overrides the level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(args: CommonArgs) -> Result<RunReport> {
    let config = build_config(args)?;
    debug!(?config, "resolved run config");
    Ok(run(&config)?)
}

/// Config file (or defaults), then flags, then prompts for what is still missing.
fn build_config(args: CommonArgs) -> Result<RunConfig> {
    let from_file = args.config.is_some();
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(symbol) = args.symbol {
        config.run.symbol = symbol;
    }
    if let Some(start) = args.start.as_deref() {
        config.run.start_date = parse_date(start)?;
    }
    if let Some(investment) = args.investment {
        config.run.investment = investment;
    }
    if let Some(source) = args.source {
        config.data.source = source.into();
    }
    if let Some(csv) = args.csv {
        config.data.csv_path = Some(csv);
        if args.source.is_none() {
            config.data.source = SourceKind::Csv;
        }
    }
    if let Some(path) = args.api_key_file {
        config.data.api_key_file = Some(path);
    }
    if let Some(slow) = args.slow {
        config.macd.slow = slow;
    }
    if let Some(fast) = args.fast {
        config.macd.fast = fast;
    }
    if let Some(smooth) = args.smooth {
        config.macd.smooth = smooth;
    }
    if let Some(timing) = args.timing {
        config.backtest.timing = timing.into();
    }
    if args.start_long {
        config.backtest.initial_position = InitialPosition::Long;
    }

    if config.run.symbol.trim().is_empty() {
        config.run.symbol = prompt("Stock Ticker: ")?.to_uppercase();
    }
    if !from_file {
        if args.start.is_none() {
            config.run.start_date = parse_date(&prompt("Date: ")?)?;
        }
        if args.investment.is_none() {
            let answer = prompt("Investment: ")?;
            if !answer.is_empty() {
                config.run.investment = answer
                    .parse()
                    .with_context(|| format!("invalid investment amount '{answer}'"))?;
            }
        }
    }

    config.validate()?;
    Ok(config)
}

/// Empty input means no start-date filter.
fn parse_date(s: &str) -> Result<Option<NaiveDate>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))?;
    Ok(Some(date))
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("no input for '{}'", label.trim_end_matches([':', ' ']));
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_date_means_no_filter() {
        assert_eq!(parse_date("").unwrap(), None);
        assert_eq!(parse_date("  ").unwrap(), None);
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(
            parse_date("2021-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 15)
        );
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(parse_date("15/03/2021").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn source_flag_uses_kebab_case() {
        let cli = Cli::try_parse_from([
            "macdlab",
            "run",
            "--symbol",
            "IBM",
            "--source",
            "alpha-vantage",
            "--timing",
            "same-bar",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { common, json } => {
                assert!(!json);
                assert!(matches!(common.source, Some(SourceArg::AlphaVantage)));
                assert!(matches!(common.timing, Some(TimingArg::SameBar)));
                assert_eq!(common.tail, DEFAULT_TAIL);
            }
            Commands::Macd { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "[run]\nsymbol = \"IBM\"\ninvestment = 5000.0\n[macd]\nslow = 30\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "macdlab",
            "macd",
            "--config",
            path.to_str().unwrap(),
            "--symbol",
            "AAPL",
            "--fast",
            "8",
            "--source",
            "synthetic",
        ])
        .unwrap();
        let Commands::Macd { common } = cli.command else {
            panic!("expected macd");
        };
        let config = build_config(common).unwrap();
        assert_eq!(config.run.symbol, "AAPL");
        assert_eq!(config.run.investment, 5000.0);
        assert_eq!(config.macd.slow, 30);
        assert_eq!(config.macd.fast, 8);
        assert_eq!(config.data.source, SourceKind::Synthetic);
    }
}
