//! Quote normalization
//!
//! Venues disagree on how they encode numbers: Kraken sends strings
//! (`"23423.09000"`), Coinmetro sends price keys as strings and sizes as
//! JSON numbers. Everything is converted to `Decimal` here. Individual
//! levels that cannot be parsed are dropped and reported; they never
//! abort a cycle.

use crate::core::{Quote, Side, Venue};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Numeric field as sent by a venue
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Text(String),
    Number(serde_json::Number),
}

impl RawNumber {
    /// Convert to an exact decimal.
    ///
    /// JSON numbers go through their shortest decimal text, so `0.1` stays
    /// `0.1` instead of picking up binary-float digits.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let text = match self {
            RawNumber::Text(s) => s.trim().to_string(),
            RawNumber::Number(n) => n.to_string(),
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        RawNumber::Text(s.to_string())
    }
}

impl From<f64> for RawNumber {
    fn from(v: f64) -> Self {
        serde_json::Number::from_f64(v)
            .map(RawNumber::Number)
            .unwrap_or_else(|| RawNumber::Text(v.to_string()))
    }
}

/// One book level: `[price, quantity]` or `[price, quantity, timestamp]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawLevel(pub Vec<RawNumber>);

impl RawLevel {
    pub fn new(price: impl Into<RawNumber>, quantity: impl Into<RawNumber>) -> Self {
        Self(vec![price.into(), quantity.into()])
    }
}

/// Raw payload of one venue, as handed over by a fetch adapter
#[derive(Debug, Clone, PartialEq)]
pub struct RawVenueBook {
    pub venue: Venue,
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

impl RawVenueBook {
    pub fn new(venue: Venue, bids: Vec<RawLevel>, asks: Vec<RawLevel>) -> Self {
        Self { venue, bids, asks }
    }
}

/// A level that was dropped during normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedQuote {
    pub venue: Venue,
    pub side: Side,
    pub reason: String,
}

/// Normalizer output for one venue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Bids first, then asks, in payload order
    pub quotes: Vec<Quote>,
    pub rejected: Vec<RejectedQuote>,
}

/// Largest accepted `price * quantity` for one level (1e20).
///
/// Keeps fee, profit and inventory arithmetic far from `Decimal::MAX`.
const MAX_NOTIONAL: Decimal = Decimal::from_parts(0x6310_0000, 0x6BC7_5E2D, 0x5, false, 0);

/// Converts raw venue payloads into canonical quotes
pub struct Normalizer;

impl Normalizer {
    pub fn normalize(book: &RawVenueBook) -> Normalized {
        let mut out = Normalized::default();

        for (levels, side) in [(&book.bids, Side::Bid), (&book.asks, Side::Ask)] {
            for level in levels {
                match Self::parse_level(level) {
                    Ok((price, quantity)) => {
                        out.quotes
                            .push(Quote::new(price, quantity, side, book.venue.clone()));
                    }
                    Err(reason) => {
                        crate::log_venue!(
                            tracing::Level::WARN,
                            venue = %book.venue,
                            side = %side,
                            "Dropping quote: {}",
                            reason
                        );
                        out.rejected.push(RejectedQuote {
                            venue: book.venue.clone(),
                            side,
                            reason,
                        });
                    }
                }
            }
        }

        out
    }

    fn parse_level(level: &RawLevel) -> Result<(Decimal, Decimal), String> {
        let [price, quantity, ..] = level.0.as_slice() else {
            return Err(format!("expected at least 2 fields, got {}", level.0.len()));
        };

        let price = price
            .to_decimal()
            .ok_or_else(|| format!("unparsable price {:?}", price))?;
        let quantity = quantity
            .to_decimal()
            .ok_or_else(|| format!("unparsable quantity {:?}", quantity))?;

        if price <= Decimal::ZERO {
            return Err(format!("non-positive price {}", price));
        }
        if quantity <= Decimal::ZERO {
            return Err(format!("non-positive quantity {}", quantity));
        }
        match price.checked_mul(quantity) {
            Some(notional) if notional <= MAX_NOTIONAL => {}
            _ => {
                return Err(format!(
                    "notional of {} x {} out of range",
                    price, quantity
                ))
            }
        }

        Ok((price, quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dec;

    #[test]
    fn test_raw_number_text_and_number() {
        assert_eq!(RawNumber::from("23423.09000").to_decimal(), Some(dec("23423.09")));
        let n: RawNumber = serde_json::from_str("0.30639636").unwrap();
        assert_eq!(n.to_decimal(), Some(dec("0.30639636")));
        let n: RawNumber = serde_json::from_str("1702311080").unwrap();
        assert_eq!(n.to_decimal(), Some(dec("1702311080")));
        assert_eq!(RawNumber::from("abc").to_decimal(), None);
    }

    #[test]
    fn test_raw_number_scientific() {
        let n: RawNumber = serde_json::from_str("1e-5").unwrap();
        assert_eq!(n.to_decimal(), Some(dec("0.00001")));
    }

    #[test]
    fn test_kraken_style_levels() {
        let bids: Vec<RawLevel> =
            serde_json::from_str(r#"[["23423.09000","1.200",1702311080],["23424.02000","0.005",1702311076]]"#)
                .unwrap();
        let asks: Vec<RawLevel> =
            serde_json::from_str(r#"[["23425.01000","0.058",1702311076]]"#).unwrap();

        let out = Normalizer::normalize(&RawVenueBook::new("Kraken".into(), bids, asks));

        assert!(out.rejected.is_empty());
        assert_eq!(
            out.quotes,
            vec![
                Quote::new(dec("23423.09"), dec("1.2"), Side::Bid, "Kraken".into()),
                Quote::new(dec("23424.02"), dec("0.005"), Side::Bid, "Kraken".into()),
                Quote::new(dec("23425.01"), dec("0.058"), Side::Ask, "Kraken".into()),
            ]
        );
    }

    #[test]
    fn test_bad_levels_are_dropped_and_reported() {
        let bids = vec![
            RawLevel::new("23428.00", 0.30639636),
            RawLevel::new("not-a-price", 1.0),
            RawLevel(vec![RawNumber::from("1.0")]),
        ];
        let asks = vec![RawLevel::new("23437.2", "0"), RawLevel::new("23437.3", "0.1")];

        let out = Normalizer::normalize(&RawVenueBook::new("Coinmetro".into(), bids, asks));

        assert_eq!(out.quotes.len(), 2);
        assert_eq!(out.quotes[0].quantity, dec("0.30639636"));
        assert_eq!(out.quotes[1].side, Side::Ask);
        assert_eq!(out.rejected.len(), 3);
        assert!(out.rejected.iter().all(|r| r.venue.as_str() == "Coinmetro"));
        assert_eq!(out.rejected[2].side, Side::Ask);
    }

    #[test]
    fn test_oversized_levels_are_rejected() {
        assert_eq!(MAX_NOTIONAL, dec("100000000000000000000"));

        let bids = vec![
            RawLevel::new("20000000000000000000", "100000000000"),
            RawLevel::new("23428.00", "1"),
        ];
        let asks = vec![RawLevel::new("10000000000", "10000000000.000001")];

        let out = Normalizer::normalize(&RawVenueBook::new("Coinmetro".into(), bids, asks));

        assert_eq!(out.quotes.len(), 1);
        assert_eq!(out.quotes[0].price, dec("23428.00"));
        assert_eq!(out.rejected.len(), 2);
        assert!(out.rejected[0].reason.contains("out of range"));
    }
}
