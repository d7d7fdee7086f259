//! Order book replica module
//!
//! Maintains per-instrument bid/ask level state from a snapshot-then-deltas
//! feed and derives ranked depth ladders and pressure metrics from it.

mod book;
mod ladder;
mod manager;
mod metrics;

pub use book::OrderBook;
pub use ladder::{Ladder, RankedLevel, TotalUnit};
pub use manager::BookManager;
pub use metrics::{VolumePressure, DEFAULT_PRESSURE_DEPTH};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

/// A single price level: resting quantity at a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}
