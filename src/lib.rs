//! Depth ladder engine
//!
//! This crate maintains replica order books from a snapshot and delta feed
//! and derives ranked depth ladders, pressure metrics, and display-ready
//! views for a rendering surface.

use std::sync::Arc;
use tokio::sync::RwLock;

pub mod config;
pub mod error;
pub mod feed;
pub mod orderbook;
pub mod publisher;
pub mod view;
pub mod ws;

pub use config::Config;
pub use error::{LadderError, Result};
pub use feed::{parse_event, FeedEvent, OrderBookMessage};
pub use orderbook::{
    BookManager, Ladder, OrderBook, PriceLevel, RankedLevel, Side, TotalUnit, VolumePressure,
};
pub use publisher::Publisher;
pub use view::{format_amount, DepthView, DisplayMode, PriceSelector, ViewConfig, ViewRow};
pub use ws::FeedManager;

/// Application state shared across components
pub struct AppState {
    pub books: Arc<RwLock<BookManager>>,
    pub publisher: Arc<Publisher>,
    pub config: Arc<Config>,
}
