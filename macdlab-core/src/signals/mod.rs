//! Signal generation from indicator series.
//!
//! Signals depend only on market data and indicator values, never on
//! backtest results.

pub mod crossover;

pub use crossover::{generate_signals, transition, Crossover, CrossoverSignals, HoldState};
