//! Core order book replica
//!
//! BTreeMap-backed level store plus the snapshot/delta update rules.

use chrono::Utc;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::{Ladder, PriceLevel, Side, VolumePressure};
use crate::feed::OrderBookMessage;

/// Order book replica for a single instrument.
///
/// Holds one price-keyed map per side; a price appears at most once per
/// side and only with a strictly positive quantity. The book starts
/// un-synced and rejects deltas until the first snapshot arrives; a
/// snapshot is always authoritative and resets the sequence cursor, which
/// afterwards guards against stale or re-delivered deltas.
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    /// Bids keyed descending (best bid first)
    bids: BTreeMap<Reverse<Decimal>, Decimal>,
    /// Asks keyed ascending (best ask first)
    asks: BTreeMap<Decimal, Decimal>,
    /// Sequence of the last applied message, 0 until known
    last_sequence: u64,
    /// Whether an authoritative snapshot has been applied
    synced: bool,
    /// Wall-clock time of the last accepted message
    last_update_ms: i64,
}

impl OrderBook {
    /// Create a new empty, un-synced book.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_sequence: 0,
            synced: false,
            last_update_ms: 0,
        }
    }

    /// Apply a normalized feed message.
    ///
    /// Returns whether the message was accepted: snapshots always are;
    /// deltas are dropped while the book is un-synced or when their
    /// sequence is stale.
    pub fn apply(&mut self, message: &OrderBookMessage) -> bool {
        match message {
            OrderBookMessage::Snapshot {
                sequence,
                asks,
                bids,
            } => {
                self.apply_snapshot(*sequence, asks, bids);
                true
            }
            OrderBookMessage::Delta {
                sequence,
                asks,
                bids,
            } => self.apply_delta(*sequence, asks, bids),
        }
    }

    /// Replace both sides with snapshot contents.
    ///
    /// Idempotent: re-applying the same snapshot leaves the book unchanged.
    pub fn apply_snapshot(
        &mut self,
        sequence: Option<u64>,
        asks: &[PriceLevel],
        bids: &[PriceLevel],
    ) {
        self.asks.clear();
        self.bids.clear();

        for level in asks {
            self.apply_level(Side::Ask, level);
        }
        for level in bids {
            self.apply_level(Side::Bid, level);
        }

        self.last_sequence = sequence.unwrap_or(0);
        self.synced = true;
        self.touch();
    }

    /// Apply a partial update to the prices it mentions.
    ///
    /// Returns false without touching the store when no snapshot has been
    /// seen yet, or when `sequence` is at or behind the cursor.
    pub fn apply_delta(
        &mut self,
        sequence: Option<u64>,
        asks: &[PriceLevel],
        bids: &[PriceLevel],
    ) -> bool {
        if !self.synced {
            return false;
        }
        if let Some(seq) = sequence {
            if seq <= self.last_sequence {
                return false;
            }
        }

        for level in asks {
            self.apply_level(Side::Ask, level);
        }
        for level in bids {
            self.apply_level(Side::Bid, level);
        }

        if let Some(seq) = sequence {
            self.last_sequence = seq;
        }
        self.touch();
        true
    }

    /// Upsert or remove a single price level.
    ///
    /// A non-positive price never enters the store; a zero quantity removes
    /// the price (no-op when absent); a negative quantity is discarded.
    fn apply_level(&mut self, side: Side, level: &PriceLevel) {
        if level.price <= Decimal::ZERO {
            return;
        }
        match side {
            Side::Bid => {
                if level.quantity == Decimal::ZERO {
                    self.bids.remove(&Reverse(level.price));
                } else if level.quantity > Decimal::ZERO {
                    self.bids.insert(Reverse(level.price), level.quantity);
                }
            }
            Side::Ask => {
                if level.quantity == Decimal::ZERO {
                    self.asks.remove(&level.price);
                } else if level.quantity > Decimal::ZERO {
                    self.asks.insert(level.price, level.quantity);
                }
            }
        }
    }

    /// Current contents of one side, best price first.
    pub fn levels(&self, side: Side) -> Vec<PriceLevel> {
        match side {
            Side::Ask => self
                .asks
                .iter()
                .map(|(p, q)| PriceLevel::new(*p, *q))
                .collect(),
            Side::Bid => self
                .bids
                .iter()
                .map(|(Reverse(p), q)| PriceLevel::new(*p, *q))
                .collect(),
        }
    }

    /// Number of resting levels on one side.
    pub fn depth(&self, side: Side) -> usize {
        match side {
            Side::Ask => self.asks.len(),
            Side::Bid => self.bids.len(),
        }
    }

    /// Build the ranked ladder for one side at the given depth.
    pub fn ladder(&self, side: Side, depth: usize) -> Ladder {
        Ladder::build(self, side, depth)
    }

    /// Buy/sell pressure over a fixed window per side, independent of any
    /// display depth.
    pub fn pressure(&self, window: usize) -> VolumePressure {
        VolumePressure::from_ladders(
            &self.ladder(Side::Bid, window),
            &self.ladder(Side::Ask, window),
        )
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first_key_value().map(|(Reverse(p), _)| *p)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first_key_value().map(|(p, _)| *p)
    }

    /// Get mid price
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    /// Get spread in basis points
    pub fn spread_bps(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask(), self.mid_price()) {
            (Some(bid), Some(ask), Some(mid)) if mid > Decimal::ZERO => {
                Some((ask - bid) / mid * Decimal::from(10_000))
            }
            _ => None,
        }
    }

    /// Whether an authoritative snapshot has been applied.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Sequence of the last applied message.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Wall-clock milliseconds of the last accepted message.
    pub fn last_update_ms(&self) -> i64 {
        self.last_update_ms
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn touch(&mut self) {
        self.last_update_ms = Utc::now().timestamp_millis();
    }
}
