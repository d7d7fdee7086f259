//! Presentation adapter
//!
//! Maps ladders and pressure metrics into the row records a rendering
//! surface paints: unit-converted totals, compact K/M display strings,
//! proportional bar widths, and a mark-price row placed according to the
//! active display mode. Mode and unit are plain configuration passed per
//! call; building a view never mutates book state.

use ordered_float::NotNan;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::mpsc;

use crate::orderbook::{
    OrderBook, RankedLevel, Side, TotalUnit, VolumePressure, DEFAULT_PRESSURE_DEPTH,
};

/// Levels shown per side when both ladders share the viewport.
const COMPOSITE_DEPTH: usize = 9;
/// Levels shown when a single side has the viewport to itself.
const SINGLE_SIDE_DEPTH: usize = 20;

/// Which sides the rendering surface is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Both sides around a mark-price row, a few levels each.
    Composite,
    /// Ask ladder only, at full depth.
    AsksOnly,
    /// Bid ladder only, at full depth.
    BidsOnly,
}

impl DisplayMode {
    /// Ladder depth per side for this mode.
    pub fn depth(self) -> usize {
        match self {
            DisplayMode::Composite => COMPOSITE_DEPTH,
            DisplayMode::AsksOnly | DisplayMode::BidsOnly => SINGLE_SIDE_DEPTH,
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "composite" => Ok(DisplayMode::Composite),
            "asks" | "asks_only" => Ok(DisplayMode::AsksOnly),
            "bids" | "bids_only" => Ok(DisplayMode::BidsOnly),
            other => Err(format!("unknown display mode: {other}")),
        }
    }
}

/// Per-call view configuration.
#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    pub mode: DisplayMode,
    pub unit: TotalUnit,
    /// Window for the pressure block, independent of the display depth.
    pub pressure_depth: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Composite,
            unit: TotalUnit::Base,
            pressure_depth: DEFAULT_PRESSURE_DEPTH,
        }
    }
}

/// One row of the rendered ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewRow {
    /// A price level with its display annotations.
    Level {
        side: Side,
        price: Decimal,
        quantity: Decimal,
        /// Running total in the selected unit.
        total: Decimal,
        /// Compact rendering of `total` (K/M abbreviated).
        total_display: String,
        /// Bar width as a percentage of the window maximum.
        bar_pct: Decimal,
        rank: usize,
    },
    /// The mark-price row separating or heading the ladders.
    Mark { price: Decimal },
}

impl ViewRow {
    fn level(side: Side, entry: &RankedLevel, unit: TotalUnit) -> Self {
        let total = entry.total_in(unit);
        ViewRow::Level {
            side,
            price: entry.price,
            quantity: entry.quantity,
            total,
            total_display: format_amount(total),
            bar_pct: (entry.share_of_window * Decimal::from(100))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            rank: entry.rank,
        }
    }
}

/// Display-ready state published to the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthView {
    pub symbol: String,
    pub mode: DisplayMode,
    pub unit: TotalUnit,
    pub timestamp_ms: i64,
    pub rows: Vec<ViewRow>,
    pub pressure: VolumePressure,
}

impl DepthView {
    /// Assemble the view for the current book state.
    ///
    /// Composite mode lists asks worst-to-best, then the mark row, then
    /// bids best-to-worst, so both ladders read toward the mark. The
    /// single-side modes put the mark row first and keep rank order. The
    /// mark is the book's mid price and is omitted while either side is
    /// empty.
    pub fn build(book: &OrderBook, config: ViewConfig) -> Self {
        let depth = config.mode.depth();
        let mark = book.mid_price();
        let mut rows = Vec::new();

        match config.mode {
            DisplayMode::Composite => {
                let asks = book.ladder(Side::Ask, depth);
                let bids = book.ladder(Side::Bid, depth);
                for entry in asks.levels.iter().rev() {
                    rows.push(ViewRow::level(Side::Ask, entry, config.unit));
                }
                if let Some(price) = mark {
                    rows.push(ViewRow::Mark { price });
                }
                for entry in &bids.levels {
                    rows.push(ViewRow::level(Side::Bid, entry, config.unit));
                }
            }
            DisplayMode::AsksOnly => {
                if let Some(price) = mark {
                    rows.push(ViewRow::Mark { price });
                }
                for entry in &book.ladder(Side::Ask, depth).levels {
                    rows.push(ViewRow::level(Side::Ask, entry, config.unit));
                }
            }
            DisplayMode::BidsOnly => {
                if let Some(price) = mark {
                    rows.push(ViewRow::Mark { price });
                }
                for entry in &book.ladder(Side::Bid, depth).levels {
                    rows.push(ViewRow::level(Side::Bid, entry, config.unit));
                }
            }
        }

        DepthView {
            symbol: book.symbol().to_string(),
            mode: config.mode,
            unit: config.unit,
            timestamp_ms: book.last_update_ms(),
            rows,
            pressure: book.pressure(config.pressure_depth),
        }
    }
}

/// Format an amount compactly: `1.234K`, `12.500M`, plain below 1,000.
///
/// Abbreviations carry exactly three decimal places; plain values keep
/// their own digits with trailing zeros trimmed. Display only; stored
/// totals are never abbreviated.
pub fn format_amount(value: Decimal) -> String {
    let million = Decimal::from(1_000_000);
    let thousand = Decimal::from(1_000);

    if value >= million {
        format!("{}M", fixed_3dp(value / million))
    } else if value >= thousand {
        format!("{}K", fixed_3dp(value / thousand))
    } else {
        value.normalize().to_string()
    }
}

fn fixed_3dp(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.3}")
}

/// Outbound "use this price" side channel.
///
/// The rendering surface invokes [`PriceSelector::select`] with a
/// displayed price; the raw value is forwarded to whoever owns the
/// receiving end (an order-entry form in the surrounding product).
/// Non-positive or non-finite prices are rejected, as is an emission after
/// the receiver has gone away; neither case panics or errors.
#[derive(Debug, Clone)]
pub struct PriceSelector {
    tx: mpsc::UnboundedSender<NotNan<f64>>,
}

impl PriceSelector {
    /// Create a selector and the receiving half of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotNan<f64>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit `price` on the channel. Returns whether it was actually sent.
    pub fn select(&self, price: Decimal) -> bool {
        if price <= Decimal::ZERO {
            return false;
        }
        let Some(raw) = price.to_f64() else {
            return false;
        };
        match NotNan::new(raw) {
            Ok(value) if value.is_finite() => self.tx.send(value).is_ok(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::PriceLevel;
    use rust_decimal_macros::dec;

    fn book() -> OrderBook {
        let mut book = OrderBook::new("BTCUSDT");
        book.apply_snapshot(
            Some(1),
            &[
                PriceLevel::new(dec!(100), dec!(2)),
                PriceLevel::new(dec!(101), dec!(3)),
                PriceLevel::new(dec!(102), dec!(4)),
            ],
            &[
                PriceLevel::new(dec!(99), dec!(5)),
                PriceLevel::new(dec!(98), dec!(1)),
                PriceLevel::new(dec!(97), dec!(2)),
            ],
        );
        book
    }

    fn deep_book(levels_per_side: usize) -> OrderBook {
        let mut book = OrderBook::new("BTCUSDT");
        let asks: Vec<PriceLevel> = (0..levels_per_side)
            .map(|i| PriceLevel::new(dec!(100) + Decimal::from(i as u32), dec!(1)))
            .collect();
        let bids: Vec<PriceLevel> = (0..levels_per_side)
            .map(|i| PriceLevel::new(dec!(99) - Decimal::from(i as u32), dec!(1)))
            .collect();
        book.apply_snapshot(Some(1), &asks, &bids);
        book
    }

    fn row_prices(view: &DepthView) -> Vec<Decimal> {
        view.rows
            .iter()
            .map(|row| match row {
                ViewRow::Level { price, .. } => *price,
                ViewRow::Mark { price } => *price,
            })
            .collect()
    }

    #[test]
    fn composite_reads_toward_the_mark_row() {
        let view = DepthView::build(&book(), ViewConfig::default());

        assert_eq!(
            row_prices(&view),
            vec![
                dec!(102),
                dec!(101),
                dec!(100),
                dec!(99.5), // mark
                dec!(99),
                dec!(98),
                dec!(97)
            ]
        );
        assert!(matches!(view.rows[3], ViewRow::Mark { .. }));
    }

    #[test]
    fn composite_caps_each_side_at_nine() {
        let view = DepthView::build(&deep_book(12), ViewConfig::default());
        // 9 asks + mark + 9 bids
        assert_eq!(view.rows.len(), 19);
    }

    #[test]
    fn asks_only_heads_the_ladder_with_the_mark() {
        let config = ViewConfig {
            mode: DisplayMode::AsksOnly,
            ..ViewConfig::default()
        };
        let view = DepthView::build(&deep_book(25), config);

        assert!(matches!(view.rows[0], ViewRow::Mark { .. }));
        assert_eq!(view.rows.len(), 1 + 20);
        let prices = row_prices(&view);
        // Rank order: best ask first, ascending away from the mark.
        assert_eq!(prices[1], dec!(100));
        assert!(prices[1..].windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn bids_only_descends_from_the_best_bid() {
        let config = ViewConfig {
            mode: DisplayMode::BidsOnly,
            ..ViewConfig::default()
        };
        let view = DepthView::build(&deep_book(25), config);

        assert!(matches!(view.rows[0], ViewRow::Mark { .. }));
        assert_eq!(view.rows.len(), 1 + 20);
        let prices = row_prices(&view);
        assert_eq!(prices[1], dec!(99));
        assert!(prices[1..].windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn mark_row_needs_both_sides() {
        let mut book = OrderBook::new("BTCUSDT");
        book.apply_snapshot(Some(1), &[PriceLevel::new(dec!(100), dec!(2))], &[]);

        let view = DepthView::build(&book, ViewConfig::default());
        assert!(view.rows.iter().all(|row| matches!(row, ViewRow::Level { .. })));
    }

    #[test]
    fn quote_unit_swaps_totals_to_notional() {
        let config = ViewConfig {
            unit: TotalUnit::Quote,
            ..ViewConfig::default()
        };
        let view = DepthView::build(&book(), config);

        // Best ask row sits directly above the mark in composite order.
        let ViewRow::Level { total, .. } = &view.rows[2] else {
            panic!("expected a level row");
        };
        assert_eq!(*total, dec!(200)); // 100 * cum 2
    }

    #[test]
    fn bar_widths_grow_toward_the_window_edge() {
        let config = ViewConfig {
            mode: DisplayMode::BidsOnly,
            ..ViewConfig::default()
        };
        let view = DepthView::build(&book(), config);

        let bars: Vec<Decimal> = view
            .rows
            .iter()
            .filter_map(|row| match row {
                ViewRow::Level { bar_pct, .. } => Some(*bar_pct),
                ViewRow::Mark { .. } => None,
            })
            .collect();

        assert_eq!(*bars.last().unwrap(), dec!(100));
        assert!(bars.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn switching_modes_leaves_the_book_alone() {
        let book = book();
        let before_asks = book.levels(Side::Ask);
        let before_bids = book.levels(Side::Bid);

        let composite = DepthView::build(&book, ViewConfig::default());
        let bids_only = DepthView::build(
            &book,
            ViewConfig {
                mode: DisplayMode::BidsOnly,
                ..ViewConfig::default()
            },
        );

        assert_eq!(book.levels(Side::Ask), before_asks);
        assert_eq!(book.levels(Side::Bid), before_bids);
        // Pressure is mode-independent.
        assert_eq!(composite.pressure, bids_only.pressure);
    }

    #[test]
    fn pressure_window_ignores_display_depth() {
        let config = ViewConfig {
            pressure_depth: 2,
            ..ViewConfig::default()
        };
        let narrow = DepthView::build(&book(), config);
        let wide = DepthView::build(&book(), ViewConfig::default());

        assert_eq!(narrow.pressure.total_ask_volume, dec!(5));
        assert_eq!(wide.pressure.total_ask_volume, dec!(9));
        assert_eq!(narrow.rows.len(), wide.rows.len());
    }

    #[test]
    fn amounts_abbreviate_with_k_and_m() {
        assert_eq!(format_amount(dec!(0)), "0");
        assert_eq!(format_amount(dec!(2)), "2");
        assert_eq!(format_amount(dec!(845.120)), "845.12");
        assert_eq!(format_amount(dec!(999.999)), "999.999");
        assert_eq!(format_amount(dec!(1000)), "1.000K");
        assert_eq!(format_amount(dec!(1234.5)), "1.235K");
        assert_eq!(format_amount(dec!(999999)), "999.999K");
        assert_eq!(format_amount(dec!(1000000)), "1.000M");
        assert_eq!(format_amount(dec!(12345678)), "12.346M");
        assert_eq!(format_amount(dec!(2500000000)), "2500.000M");
    }

    #[test]
    fn selector_emits_only_valid_prices() {
        let (selector, mut rx) = PriceSelector::channel();

        assert!(selector.select(dec!(101.5)));
        assert_eq!(rx.try_recv().unwrap().into_inner(), 101.5);

        assert!(!selector.select(dec!(0)));
        assert!(!selector.select(dec!(-5)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn selector_survives_a_dropped_receiver() {
        let (selector, rx) = PriceSelector::channel();
        drop(rx);
        assert!(!selector.select(dec!(101.5)));
    }

    #[test]
    fn display_mode_parses_from_config_strings() {
        assert_eq!(
            "composite".parse::<DisplayMode>().unwrap(),
            DisplayMode::Composite
        );
        assert_eq!("asks".parse::<DisplayMode>().unwrap(), DisplayMode::AsksOnly);
        assert_eq!(
            "bids_only".parse::<DisplayMode>().unwrap(),
            DisplayMode::BidsOnly
        );
        assert!("ladder".parse::<DisplayMode>().is_err());
    }
}
