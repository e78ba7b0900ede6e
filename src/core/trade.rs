//! Matched trade legs and per-venue inventory deltas

use super::order::{OrderRecord, Side, Venue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::PrimitiveDateTime;

time::serde::format_description!(
    ledger_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

/// One side of a match, as recorded in the matched-orders ledger.
///
/// Field names map onto the ledger columns
/// `Timestamp, Price, Quantity, Side, Venue, Fee, NetPrice,
/// MatchedQuantity, RemainingQuantity`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchedTradeLeg {
    #[serde(rename = "Timestamp", with = "ledger_timestamp")]
    pub timestamp: PrimitiveDateTime,
    #[serde(rename = "Price")]
    pub price: Decimal,
    /// Original order quantity, not the matched amount
    #[serde(rename = "Quantity")]
    pub quantity: Decimal,
    #[serde(rename = "Side")]
    pub side: Side,
    #[serde(rename = "Venue")]
    pub venue: Venue,
    #[serde(rename = "Fee")]
    pub fee: Decimal,
    #[serde(rename = "NetPrice")]
    pub net_price: Decimal,
    #[serde(rename = "MatchedQuantity")]
    pub matched_quantity: Decimal,
    /// Remaining quantity of the order right after this match
    #[serde(rename = "RemainingQuantity")]
    pub remaining_quantity: Decimal,
}

impl MatchedTradeLeg {
    /// Snapshot a record right after it was filled by `matched`
    pub fn from_record(record: &OrderRecord, matched: Decimal, timestamp: PrimitiveDateTime) -> Self {
        Self {
            timestamp,
            price: record.price,
            quantity: record.quantity,
            side: record.side,
            venue: record.venue.clone(),
            fee: record.fee,
            net_price: record.net_price,
            matched_quantity: matched,
            remaining_quantity: record.remaining_quantity,
        }
    }
}

/// Signed change of one venue's balances over a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryDelta {
    /// Base asset (e.g. BTC)
    pub base: Decimal,
    /// Quote currency (e.g. EUR)
    pub quote: Decimal,
}

/// Inventory deltas keyed by venue, reset every cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryLedger {
    deltas: BTreeMap<Venue, InventoryDelta>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// We sell `matched` base into a bid at `net_price`
    pub fn record_bid_fill(&mut self, venue: &Venue, net_price: Decimal, matched: Decimal) {
        let delta = self.deltas.entry(venue.clone()).or_default();
        delta.base -= matched;
        delta.quote += net_price * matched;
    }

    /// We buy `matched` base from an ask at `net_price`
    pub fn record_ask_fill(&mut self, venue: &Venue, net_price: Decimal, matched: Decimal) {
        let delta = self.deltas.entry(venue.clone()).or_default();
        delta.quote -= net_price * matched;
        delta.base += matched;
    }

    /// Delta for `venue`, zero when it did not trade
    pub fn get(&self, venue: &Venue) -> InventoryDelta {
        self.deltas.get(venue).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Venue, &InventoryDelta)> {
        self.deltas.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}
