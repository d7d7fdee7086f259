//! Book manager
//!
//! Routes feed messages to per-instrument book replicas. Each instrument's
//! book is independent state; nothing is shared across symbols, so
//! parallel instruments never contend beyond the map itself.

use std::collections::HashMap;
use tracing::debug;

use super::{Ladder, OrderBook, Side, VolumePressure};
use crate::feed::OrderBookMessage;
use crate::view::{DepthView, ViewConfig};

/// Registry of book replicas, one per tracked symbol.
#[derive(Debug, Default)]
pub struct BookManager {
    books: HashMap<String, OrderBook>,
}

impl BookManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
        }
    }

    /// Start tracking an instrument with an empty, un-synced book.
    pub fn track(&mut self, symbol: &str) {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| OrderBook::new(symbol));
    }

    /// Stop tracking an instrument, dropping its book and anything derived
    /// from it.
    pub fn untrack(&mut self, symbol: &str) {
        self.books.remove(symbol);
    }

    /// Route a normalized message to the instrument's book.
    ///
    /// A snapshot for an unknown symbol starts tracking it; a delta for an
    /// unknown symbol is dropped.
    pub fn apply(&mut self, symbol: &str, message: &OrderBookMessage) -> bool {
        match self.books.get_mut(symbol) {
            Some(book) => book.apply(message),
            None if matches!(message, OrderBookMessage::Snapshot { .. }) => {
                let mut book = OrderBook::new(symbol);
                let applied = book.apply(message);
                self.books.insert(symbol.to_string(), book);
                applied
            }
            None => {
                debug!(symbol = %symbol, "Dropping delta for untracked symbol");
                false
            }
        }
    }

    /// Build the display view for one instrument.
    pub fn view(&self, symbol: &str, config: ViewConfig) -> Option<DepthView> {
        self.books
            .get(symbol)
            .map(|book| DepthView::build(book, config))
    }

    /// Build one side's ladder for one instrument.
    pub fn ladder(&self, symbol: &str, side: Side, depth: usize) -> Option<Ladder> {
        self.books.get(symbol).map(|book| book.ladder(side, depth))
    }

    /// Pressure metrics for one instrument.
    pub fn pressure(&self, symbol: &str, window: usize) -> Option<VolumePressure> {
        self.books.get(symbol).map(|book| book.pressure(window))
    }

    /// Direct access to a tracked book.
    pub fn book(&self, symbol: &str) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Whether the instrument has received its snapshot yet.
    pub fn is_synced(&self, symbol: &str) -> bool {
        self.books
            .get(symbol)
            .map(|book| book.is_synced())
            .unwrap_or(false)
    }

    /// Symbols currently tracked.
    pub fn symbols(&self) -> Vec<String> {
        self.books.keys().cloned().collect()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.books.contains_key(symbol)
    }
}
