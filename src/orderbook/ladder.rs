//! Ranked depth ladder derivation
//!
//! A ladder is the display-facing slice of one side: the best `depth`
//! levels in rank order, annotated with running totals and the
//! share-of-window value a renderer turns into a proportional bar. Ladders
//! are rebuilt from the book on every request; at display depths (tens of
//! levels) recomputation is cheaper than keeping an incremental structure
//! correct.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{OrderBook, Side};

/// Unit for a ladder entry's running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalUnit {
    /// Cumulative quantity in the instrument's base asset.
    Base,
    /// Cumulative quantity valued at the entry's own price.
    Quote,
}

impl FromStr for TotalUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(TotalUnit::Base),
            "quote" => Ok(TotalUnit::Quote),
            other => Err(format!("unknown total unit: {other}")),
        }
    }
}

/// One ranked entry of a depth ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedLevel {
    pub price: Decimal,
    pub quantity: Decimal,
    /// Position from the best price, 0-based.
    pub rank: usize,
    /// Running quantity from the best price through this one.
    pub cumulative_quantity: Decimal,
    /// `price * cumulative_quantity`: the cumulative base quantity valued
    /// at this level's own price.
    pub cumulative_notional: Decimal,
    /// This entry's cumulative quantity relative to the deepest displayed
    /// one, in (0, 1]; grows monotonically from best to worst rank.
    pub share_of_window: Decimal,
}

impl RankedLevel {
    /// The running total in the requested unit.
    pub fn total_in(&self, unit: TotalUnit) -> Decimal {
        match unit {
            TotalUnit::Base => self.cumulative_quantity,
            TotalUnit::Quote => self.cumulative_notional,
        }
    }
}

/// A ranked, depth-limited view of one side of the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    pub side: Side,
    pub levels: Vec<RankedLevel>,
}

impl Ladder {
    /// Derive the ladder for `side`, truncated to the best `depth` levels.
    pub fn build(book: &OrderBook, side: Side, depth: usize) -> Self {
        let mut levels: Vec<RankedLevel> = Vec::with_capacity(depth.min(book.depth(side)));
        let mut cumulative = Decimal::ZERO;

        for (rank, level) in book
            .levels(side)
            .into_iter()
            .filter(|level| level.quantity > Decimal::ZERO)
            .take(depth)
            .enumerate()
        {
            cumulative += level.quantity;
            levels.push(RankedLevel {
                price: level.price,
                quantity: level.quantity,
                rank,
                cumulative_quantity: cumulative,
                cumulative_notional: level.price * cumulative,
                share_of_window: Decimal::ZERO,
            });
        }

        // The deepest displayed entry carries the window maximum, so its
        // share is exactly 1 and shares grow toward it.
        let max_cumulative = cumulative;
        if max_cumulative > Decimal::ZERO {
            for entry in &mut levels {
                entry.share_of_window = entry.cumulative_quantity / max_cumulative;
            }
        }

        Ladder { side, levels }
    }

    /// Cumulative quantity of the deepest displayed entry (0 when empty).
    pub fn window_total(&self) -> Decimal {
        self.levels
            .last()
            .map(|level| level.cumulative_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Best-ranked entry, if any.
    pub fn best(&self) -> Option<&RankedLevel> {
        self.levels.first()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
