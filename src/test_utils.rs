//! Shared test fixtures
//!
//! The Coinmetro/Kraken snapshot below is a real BTC/EUR capture with no
//! crossable volume once fees are applied.

use crate::core::{FeeSchedule, OrderRecord, Quote, Side};
use rust_decimal::Decimal;
use std::str::FromStr;
use time::macros::datetime;
use time::PrimitiveDateTime;

/// Parse a decimal literal
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Zero-fee record (net price == price)
pub fn record(price: &str, quantity: &str, side: Side, venue: &str) -> OrderRecord {
    OrderRecord::from_quote(
        Quote::new(dec(price), dec(quantity), side, venue.into()),
        Decimal::ZERO,
    )
}

/// Record with an explicit net price, for synthetic crossing books
pub fn record_with_net(
    price: &str,
    quantity: &str,
    side: Side,
    venue: &str,
    net_price: &str,
) -> OrderRecord {
    let mut rec = record(price, quantity, side, venue);
    rec.net_price = dec(net_price);
    rec.fee = (rec.net_price - rec.price).abs();
    rec
}

pub fn test_timestamp() -> PrimitiveDateTime {
    datetime!(2023-12-11 16:11:20)
}

fn quotes(levels: &[(&str, &str)], side: Side, venue: &str) -> Vec<Quote> {
    levels
        .iter()
        .map(|(p, q)| Quote::new(dec(p), dec(q), side, venue.into()))
        .collect()
}

/// Coinmetro then Kraken quotes, bids before asks per venue
pub fn scenario_quotes() -> Vec<Vec<Quote>> {
    let mut coinmetro = quotes(
        &[
            ("23428.00", "0.30639636"),
            ("23434.99", "0.01001201"),
            ("23437.12", "5.02312301"),
        ],
        Side::Bid,
        "Coinmetro",
    );
    coinmetro.extend(quotes(&[("23437.2", "0.21239833")], Side::Ask, "Coinmetro"));

    let mut kraken = quotes(
        &[("23423.09", "1.200"), ("23424.02", "0.005")],
        Side::Bid,
        "Kraken",
    );
    kraken.extend(quotes(
        &[
            ("23425.01", "0.058"),
            ("23426.12", "2.926"),
            ("23431.58", "0.005"),
            ("23433.49", "1.926"),
            ("23436.32", "0.005"),
        ],
        Side::Ask,
        "Kraken",
    ));

    vec![coinmetro, kraken]
}

/// Coinmetro 0.1%, Kraken 0.24%
pub fn scenario_fees() -> FeeSchedule {
    FeeSchedule::new()
        .with_rate("Coinmetro", dec("0.001"))
        .with_rate("Kraken", dec("0.0024"))
}
