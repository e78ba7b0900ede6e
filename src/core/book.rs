//! Order book assembly
//!
//! The cycle's book is a single arena of `OrderRecord`s ordered by net price.
//! Matching mutates remaining quantities through index accessors only, so a
//! record has exactly one writable representation for the whole cycle.

use super::order::{OrderRecord, Quote, Side};
use rust_decimal::Decimal;

/// Net-price ordered arena of order records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    records: Vec<OrderRecord>,
}

impl OrderBook {
    /// Build a book from records, sorting by net price (stable)
    pub fn from_records(mut records: Vec<OrderRecord>) -> Self {
        records.sort_by(|a, b| a.net_price.cmp(&b.net_price));
        Self { records }
    }

    /// Empty book - "no opportunity"
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&OrderRecord> {
        self.records.get(idx)
    }

    /// Remaining quantity at `idx` (zero for out-of-range indices)
    #[inline]
    pub fn remaining(&self, idx: usize) -> Decimal {
        self.records
            .get(idx)
            .map(|r| r.remaining_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Overwrite the remaining quantity at `idx`, clamped to `[0, quantity]`
    pub fn set_remaining(&mut self, idx: usize, remaining: Decimal) {
        if let Some(record) = self.records.get_mut(idx) {
            record.remaining_quantity = remaining.max(Decimal::ZERO).min(record.quantity);
        }
    }

    /// Consume `qty` from the record at `idx`, returning what is left.
    ///
    /// Callers pass `min(remaining of both counterparties)`, so the result
    /// never goes below zero.
    pub fn fill(&mut self, idx: usize, qty: Decimal) -> Decimal {
        match self.records.get_mut(idx) {
            Some(record) => {
                debug_assert!(qty <= record.remaining_quantity);
                record.remaining_quantity = (record.remaining_quantity - qty).max(Decimal::ZERO);
                record.remaining_quantity
            }
            None => Decimal::ZERO,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    /// Indices of all records on `side`, in book (ascending net price) order
    pub fn indices_of(&self, side: Side) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.side == side)
            .map(|(i, _)| i)
            .collect()
    }

    /// Mutable access for whole-book passes (reconciliation)
    pub(crate) fn records_mut(&mut self) -> &mut Vec<OrderRecord> {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<OrderRecord> {
        self.records
    }
}

/// Best-bid / best-ask comparison, used for reporting when nothing crosses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadReport {
    pub highest_bid_net_price: Decimal,
    pub lowest_ask_net_price: Decimal,
    /// `highest_bid - lowest_ask`, rounded to 3 places
    pub difference: Decimal,
    /// `difference / lowest_ask * 100`, rounded to 4 places
    pub spread_percent: Decimal,
}

impl SpreadReport {
    /// True when the best bid crosses the best ask after fees
    pub fn is_crossing(&self) -> bool {
        self.highest_bid_net_price > self.lowest_ask_net_price
    }
}

/// Merges per-venue quotes and trims books to the crossable range
pub struct BookAssembler;

impl BookAssembler {
    /// Concatenate every venue's quotes and sort by raw price.
    ///
    /// Ties keep concatenation order.
    pub fn merge(venues: Vec<Vec<Quote>>) -> Vec<Quote> {
        let mut merged: Vec<Quote> = venues.into_iter().flatten().collect();
        merged.sort_by(|a, b| a.price.cmp(&b.price));
        merged
    }

    /// Keep the contiguous slice from the first ask to the last bid.
    ///
    /// Returns an empty book when there is no ask, or no bid at or after
    /// the first ask: nothing in such a book can cross.
    pub fn trim(book: OrderBook) -> OrderBook {
        let records = book.into_records();

        let Some(first_ask) = records.iter().position(|r| r.side.is_ask()) else {
            return OrderBook::empty();
        };

        let Some(last_bid) = records.iter().rposition(|r| r.side.is_bid()) else {
            return OrderBook::empty();
        };

        if last_bid < first_ask {
            return OrderBook::empty();
        }

        OrderBook {
            records: records
                .into_iter()
                .skip(first_ask)
                .take(last_bid - first_ask + 1)
                .collect(),
        }
    }

    /// Compare the highest bid and lowest ask net prices.
    ///
    /// Returns `None` if either side is missing.
    pub fn spread(book: &OrderBook) -> Option<SpreadReport> {
        let highest_bid = book
            .iter()
            .filter(|r| r.side.is_bid())
            .map(|r| r.net_price)
            .max()?;
        let lowest_ask = book
            .iter()
            .filter(|r| r.side.is_ask())
            .map(|r| r.net_price)
            .min()?;

        let difference = (highest_bid - lowest_ask).round_dp(3);
        let spread_percent = if lowest_ask.is_zero() {
            Decimal::ZERO
        } else {
            (difference / lowest_ask * Decimal::ONE_HUNDRED).round_dp(4)
        };

        Some(SpreadReport {
            highest_bid_net_price: highest_bid,
            lowest_ask_net_price: lowest_ask,
            difference,
            spread_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FeeAdjuster;
    use crate::test_utils::{dec, record, scenario_fees, scenario_quotes};

    fn zero_fee_book() -> OrderBook {
        let merged = BookAssembler::merge(scenario_quotes());
        let fees = crate::core::FeeSchedule::uniform(
            &["Coinmetro".into(), "Kraken".into()],
            Decimal::ZERO,
        );
        FeeAdjuster::apply(merged, &fees).unwrap()
    }

    #[test]
    fn test_merge_sorts_by_price() {
        let merged = BookAssembler::merge(scenario_quotes());
        assert_eq!(merged.len(), 11);
        let prices: Vec<Decimal> = merged.iter().map(|q| q.price).collect();
        let mut sorted = prices.clone();
        sorted.sort();
        assert_eq!(prices, sorted);
        assert_eq!(merged[0].price, dec("23423.09"));
        assert_eq!(merged[10].price, dec("23437.2"));
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(BookAssembler::merge(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_merge_ties_keep_concatenation_order() {
        let a = Quote::new(dec("100"), dec("1"), Side::Bid, "A".into());
        let b = Quote::new(dec("100"), dec("2"), Side::Ask, "B".into());
        let merged = BookAssembler::merge(vec![vec![a.clone()], vec![b.clone()]]);
        assert_eq!(merged, vec![a, b]);
    }

    #[test]
    fn test_trim_keeps_first_ask_to_last_bid() {
        let trimmed = BookAssembler::trim(zero_fee_book());
        assert_eq!(trimmed.len(), 8);
        assert_eq!(trimmed.get(0).unwrap().price, dec("23425.01"));
        assert_eq!(trimmed.get(0).unwrap().side, Side::Ask);
        assert_eq!(trimmed.get(7).unwrap().price, dec("23437.12"));
        assert_eq!(trimmed.get(7).unwrap().side, Side::Bid);
    }

    #[test]
    fn test_trim_without_bids_is_empty() {
        let book = OrderBook::from_records(vec![
            record("101", "1", Side::Ask, "A"),
            record("102", "1", Side::Ask, "B"),
        ]);
        assert!(BookAssembler::trim(book).is_empty());
    }

    #[test]
    fn test_trim_without_asks_is_empty() {
        let book = OrderBook::from_records(vec![record("99", "1", Side::Bid, "A")]);
        assert!(BookAssembler::trim(book).is_empty());
    }

    #[test]
    fn test_trim_scenario_with_fees_has_no_opportunity() {
        let merged = BookAssembler::merge(scenario_quotes());
        let book = FeeAdjuster::apply(merged, &scenario_fees()).unwrap();
        assert!(BookAssembler::trim(book).is_empty());
    }

    #[test]
    fn test_spread_scenario() {
        let merged = BookAssembler::merge(scenario_quotes());
        let book = FeeAdjuster::apply(merged, &scenario_fees()).unwrap();
        let report = BookAssembler::spread(&book).unwrap();

        assert_eq!(report.highest_bid_net_price, dec("23413.68288"));
        assert_eq!(report.lowest_ask_net_price, dec("23460.6372"));
        assert_eq!(report.difference, dec("-46.954"));
        assert_eq!(report.spread_percent, dec("-0.2001"));
        assert!(!report.is_crossing());
    }

    #[test]
    fn test_spread_missing_side() {
        let book = OrderBook::from_records(vec![record("99", "1", Side::Bid, "A")]);
        assert!(BookAssembler::spread(&book).is_none());
    }

    #[test]
    fn test_fill_and_set_remaining_stay_in_bounds() {
        let mut book = OrderBook::from_records(vec![record("100", "5", Side::Bid, "A")]);
        assert_eq!(book.fill(0, dec("3")), dec("2"));
        assert_eq!(book.remaining(0), dec("2"));

        book.set_remaining(0, dec("9"));
        assert_eq!(book.remaining(0), dec("5"));
        book.set_remaining(0, dec("-1"));
        assert_eq!(book.remaining(0), Decimal::ZERO);
        assert_eq!(book.remaining(42), Decimal::ZERO);
    }
}
