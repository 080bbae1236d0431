//! Domain types for MACDLab

pub mod bar;
pub mod position;
pub mod price;
pub mod signal;

pub use bar::DailyBar;
pub use position::Position;
pub use price::{PricePoint, PriceSeries};
pub use signal::TradeSignal;
