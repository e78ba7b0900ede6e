//! Order records
//!
//! `Quote` is what the normalizer produces from a venue payload.
//! `OrderRecord` is a quote after fee adjustment, carrying the net price
//! and the quantity still available for matching in this cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Side {
    /// Buy interest
    Bid,
    /// Sell interest
    Ask,
}

impl Side {
    #[inline(always)]
    pub const fn is_bid(&self) -> bool {
        matches!(self, Self::Bid)
    }

    #[inline(always)]
    pub const fn is_ask(&self) -> bool {
        matches!(self, Self::Ask)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "Bid",
            Side::Ask => "Ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Venue identifier (e.g. "Coinmetro", "Kraken")
///
/// Compared by exact string equality; this is the key used for fee lookup,
/// inventory deltas and ledger reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Venue(String);

impl Venue {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Venue {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Venue {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Normalized resting quote (no fee information yet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    pub venue: Venue,
}

impl Quote {
    pub fn new(price: Decimal, quantity: Decimal, side: Side, venue: Venue) -> Self {
        Self {
            price,
            quantity,
            side,
            venue,
        }
    }
}

/// Fee-adjusted order record living in a cycle's book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    pub venue: Venue,
    /// `fee_rate(venue) * price`
    pub fee: Decimal,
    /// `price - fee` for bids, `price + fee` for asks
    pub net_price: Decimal,
    /// Quantity still available for matching, `0 <= remaining <= quantity`
    pub remaining_quantity: Decimal,
}

impl OrderRecord {
    /// Build a record from a quote and its venue fee rate.
    ///
    /// Remaining quantity starts at the full quantity.
    pub fn from_quote(quote: Quote, fee_rate: Decimal) -> Self {
        let fee = fee_rate * quote.price;
        let net_price = match quote.side {
            Side::Bid => quote.price - fee,
            Side::Ask => quote.price + fee,
        };

        Self {
            remaining_quantity: quote.quantity,
            price: quote.price,
            quantity: quote.quantity,
            side: quote.side,
            venue: quote.venue,
            fee,
            net_price,
        }
    }

    /// Identity used to find this quote again in the persisted ledger
    #[inline]
    pub fn fill_key(&self) -> FillKey {
        FillKey {
            price: self.price,
            quantity: self.quantity,
            side: self.side,
            venue: self.venue.clone(),
        }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining_quantity.is_zero()
    }
}

/// `(price, quantity, side, venue)` - how a resting quote is recognized
/// across polling cycles
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FillKey {
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    pub venue: Venue,
}
