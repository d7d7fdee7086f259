//! Feed message parsing and normalization
//!
//! Turns raw transport payloads into engine messages. Levels arrive either
//! tuple-encoded (`["100.5", "2"]`) or object-encoded
//! (`{"price": 100.5, "quantity": 2}`), with prices and quantities as JSON
//! strings or numbers; every accepted encoding is normalized into
//! [`PriceLevel`] here so the book only ever sees one shape.
//!
//! A message tagged `"type": "snapshot"` replaces the book; any other tag,
//! or no tag at all, is treated as a delta. Individually malformed levels
//! are dropped without aborting the rest of the message, and a level list
//! that is not an array counts as empty; a payload that is not a JSON
//! object at all is a structural error for the caller.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use crate::orderbook::PriceLevel;

/// Raw feed message as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMessage {
    /// Message kind tag; `"snapshot"` or anything else (delta).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Instrument symbol this message belongs to.
    #[serde(default)]
    pub symbol: Option<String>,

    /// Exchange sequence number, when the feed provides one.
    #[serde(default, alias = "seq", alias = "lastUpdateId")]
    pub sequence: Option<u64>,

    /// Ask levels, already normalized; malformed entries are dropped.
    #[serde(default, alias = "ask_levels", deserialize_with = "lenient_levels")]
    pub asks: Vec<PriceLevel>,

    /// Bid levels, already normalized; malformed entries are dropped.
    #[serde(default, alias = "bid_levels", deserialize_with = "lenient_levels")]
    pub bids: Vec<PriceLevel>,
}

/// Engine-facing message, classified and normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderBookMessage {
    /// Complete replacement of both sides.
    Snapshot {
        sequence: Option<u64>,
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
    },
    /// Partial update; a zero quantity removes the price.
    Delta {
        sequence: Option<u64>,
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
    },
}

/// A normalized message together with its routing symbol.
#[derive(Debug, Clone)]
pub struct FeedEvent {
    pub symbol: Option<String>,
    pub message: OrderBookMessage,
}

/// Parse a raw transport payload into a routed engine message.
///
/// Returns an error only when the payload is not a message-shaped JSON
/// object; an object without usable level lists normalizes to an empty
/// delta.
pub fn parse_event(raw: &str) -> Result<FeedEvent, serde_json::Error> {
    let msg: FeedMessage = serde_json::from_str(raw)?;
    Ok(FeedEvent {
        symbol: msg.symbol.clone(),
        message: msg.normalize(),
    })
}

impl FeedMessage {
    /// Classify this message as snapshot or delta.
    pub fn normalize(self) -> OrderBookMessage {
        if self.kind.as_deref() == Some("snapshot") {
            OrderBookMessage::Snapshot {
                sequence: self.sequence,
                asks: self.asks,
                bids: self.bids,
            }
        } else {
            OrderBookMessage::Delta {
                sequence: self.sequence,
                asks: self.asks,
                bids: self.bids,
            }
        }
    }
}

/// A price or quantity as encoded on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Num(f64),
}

impl RawValue {
    /// Convert to a decimal, rejecting non-finite and unparseable input.
    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            RawValue::Text(s) => Decimal::from_str(s).ok(),
            RawValue::Num(n) => Decimal::from_f64(*n),
        }
    }
}

/// One level in either wire encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Pair(RawValue, RawValue),
    Entry {
        price: RawValue,
        #[serde(alias = "qty", alias = "size", alias = "amount")]
        quantity: RawValue,
    },
}

impl RawLevel {
    fn normalize(&self) -> Option<PriceLevel> {
        let (price, quantity) = match self {
            RawLevel::Pair(p, q) => (p, q),
            RawLevel::Entry { price, quantity } => (price, quantity),
        };
        Some(PriceLevel::new(price.to_decimal()?, quantity.to_decimal()?))
    }
}

/// Deserialize a level list, dropping malformed elements instead of failing
/// the whole message. A list that is not an array at all counts as empty,
/// so a bad side never discards the other side's levels.
fn lenient_levels<'de, D>(deserializer: D) -> Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: serde_json::Value = Deserialize::deserialize(deserializer)?;
    let entries = match raw {
        serde_json::Value::Array(entries) => entries,
        _ => return Ok(Vec::new()),
    };
    Ok(entries
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value::<RawLevel>(value)
                .ok()
                .and_then(|level| level.normalize())
        })
        .collect())
}
