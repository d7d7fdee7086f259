//! Buy/sell pressure aggregation
//!
//! Computed over a fixed window of top levels per side (20 by default),
//! decoupled from whatever depth the display is currently showing. The
//! percentage pair always sums to exactly 100 and the ratio degrades to 1
//! instead of dividing by zero, so a renderer can paint the two-color
//! pressure bar without guarding any of the values.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::Ladder;

/// Default number of levels per side in the pressure window.
pub const DEFAULT_PRESSURE_DEPTH: usize = 20;

/// Aggregate volume pressure across the top of both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePressure {
    pub total_bid_volume: Decimal,
    pub total_ask_volume: Decimal,
    /// Bid volume over ask volume; 1 when there is no ask volume.
    pub bid_ask_ratio: Decimal,
    /// Rounded share of bid volume, 50 when the window is empty.
    pub buy_percentage: u32,
    /// Always `100 - buy_percentage`.
    pub sell_percentage: u32,
}

impl VolumePressure {
    /// Aggregate the two window ladders into a pressure reading.
    pub fn from_ladders(bids: &Ladder, asks: &Ladder) -> Self {
        let total_bid_volume = bids.window_total();
        let total_ask_volume = asks.window_total();

        let bid_ask_ratio = if total_ask_volume > Decimal::ZERO {
            total_bid_volume / total_ask_volume
        } else {
            Decimal::ONE
        };

        let combined = total_bid_volume + total_ask_volume;
        let buy_percentage = if combined > Decimal::ZERO {
            (Decimal::from(100) * total_bid_volume / combined)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u32()
                .unwrap_or(50)
        } else {
            50
        };

        Self {
            total_bid_volume,
            total_ask_volume,
            bid_ask_ratio,
            buy_percentage,
            sell_percentage: 100 - buy_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::{OrderBook, PriceLevel};
    use rust_decimal_macros::dec;

    fn book_with(bids: &[(Decimal, Decimal)], asks: &[(Decimal, Decimal)]) -> OrderBook {
        let mut book = OrderBook::new("BTCUSDT");
        let asks: Vec<PriceLevel> = asks
            .iter()
            .map(|(p, q)| PriceLevel::new(*p, *q))
            .collect();
        let bids: Vec<PriceLevel> = bids
            .iter()
            .map(|(p, q)| PriceLevel::new(*p, *q))
            .collect();
        book.apply_snapshot(Some(1), &asks, &bids);
        book
    }

    #[test]
    fn seventy_thirty_split() {
        let book = book_with(
            &[(dec!(99), dec!(4)), (dec!(98), dec!(3))],
            &[(dec!(100), dec!(1)), (dec!(101), dec!(2))],
        );
        let pressure = book.pressure(20);

        assert_eq!(pressure.total_bid_volume, dec!(7));
        assert_eq!(pressure.total_ask_volume, dec!(3));
        assert_eq!(pressure.buy_percentage, 70);
        assert_eq!(pressure.sell_percentage, 30);
        assert_eq!(pressure.bid_ask_ratio.round_dp(2), dec!(2.33));
    }

    #[test]
    fn ratio_falls_back_to_one_without_ask_volume() {
        let book = book_with(&[(dec!(99), dec!(5))], &[]);
        let pressure = book.pressure(20);

        assert_eq!(pressure.bid_ask_ratio, Decimal::ONE);
        assert_eq!(pressure.buy_percentage, 100);
        assert_eq!(pressure.sell_percentage, 0);
    }

    #[test]
    fn empty_window_reads_balanced() {
        let book = book_with(&[], &[]);
        let pressure = book.pressure(20);

        assert_eq!(pressure.total_bid_volume, Decimal::ZERO);
        assert_eq!(pressure.total_ask_volume, Decimal::ZERO);
        assert_eq!(pressure.bid_ask_ratio, Decimal::ONE);
        assert_eq!(pressure.buy_percentage, 50);
        assert_eq!(pressure.sell_percentage, 50);
    }

    #[test]
    fn percentages_always_sum_to_one_hundred() {
        let cases = [
            (dec!(1), dec!(2)),
            (dec!(2), dec!(1)),
            (dec!(0.1), dec!(0.9)),
            (dec!(123.456), dec!(0.001)),
            (dec!(0), dec!(5)),
            (dec!(5), dec!(0)),
        ];
        for (bid_qty, ask_qty) in cases {
            let book = book_with(&[(dec!(99), bid_qty)], &[(dec!(100), ask_qty)]);
            let pressure = book.pressure(20);
            assert_eq!(pressure.buy_percentage + pressure.sell_percentage, 100);
        }
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        let book = book_with(&[(dec!(99), dec!(1))], &[(dec!(100), dec!(199))]);
        // 100 * 1 / 200 = 0.5 -> rounds up to 1
        assert_eq!(book.pressure(20).buy_percentage, 1);

        let book = book_with(&[(dec!(99), dec!(199))], &[(dec!(100), dec!(1))]);
        // 99.5 -> rounds up to 100
        let pressure = book.pressure(20);
        assert_eq!(pressure.buy_percentage, 100);
        assert_eq!(pressure.sell_percentage, 0);
    }

    #[test]
    fn window_is_independent_of_deeper_levels() {
        let book = book_with(
            &[
                (dec!(99), dec!(1)),
                (dec!(98), dec!(1)),
                (dec!(97), dec!(50)),
            ],
            &[(dec!(100), dec!(2))],
        );

        let narrow = book.pressure(2);
        assert_eq!(narrow.total_bid_volume, dec!(2));

        let wide = book.pressure(3);
        assert_eq!(wide.total_bid_volume, dec!(52));
    }
}
