//! Cross-venue matching engine
//!
//! Crosses bids against asks on a reconciled, net-price ordered book and
//! records every match as an ask leg followed by a bid leg.
//!
//! # Two-sweep strategy
//! 1. Ask-major: asks from cheapest net price up, each against the best
//!    crossing bid that still has quantity. The sweep ends once an ask is
//!    used up.
//! 2. Bid-major: bids in book order, each against crossing asks from the
//!    cheapest up. The sweep ends once a bid is used up.
//!
//! Both sweeps mutate the same book. The second one picks up volume the
//! first leaves behind when sizes do not divide evenly; it is a greedy
//! heuristic, not an optimal assignment.

use crate::core::{InventoryLedger, MatchedTradeLeg, OrderBook, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

/// Matching algorithm selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Ask-major sweep followed by bid-major sweep
    #[default]
    TwoSweep,
    /// Single ask-major pass that keeps going until nothing crosses
    Exhaustive,
}

/// Result of matching one book
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    /// Two legs per match, ask first
    pub legs: Vec<MatchedTradeLeg>,
    /// Sum of `matched * (bid.net_price - ask.net_price)`
    pub profit: Decimal,
    pub inventory: InventoryLedger,
}

impl MatchReport {
    /// Number of matched ask/bid pairs
    pub fn match_count(&self) -> usize {
        self.legs.len() / 2
    }
}

/// Stateless matcher; all state lives in the book passed to `run`
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingEngine {
    strategy: MatchStrategy,
}

impl MatchingEngine {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Match `book` in place. Every leg is stamped with `timestamp`.
    pub fn run(&self, book: &mut OrderBook, timestamp: PrimitiveDateTime) -> MatchReport {
        let mut session = MatchSession {
            book,
            timestamp,
            report: MatchReport::default(),
        };

        match self.strategy {
            MatchStrategy::TwoSweep => {
                session.ask_major_sweep();
                session.bid_major_sweep();
            }
            MatchStrategy::Exhaustive => session.exhaustive_pass(),
        }

        session.report
    }
}

/// One `run` invocation: the book being mutated plus accumulated output
struct MatchSession<'a> {
    book: &'a mut OrderBook,
    timestamp: PrimitiveDateTime,
    report: MatchReport,
}

impl MatchSession<'_> {
    fn net_price(&self, idx: usize) -> Decimal {
        self.book.get(idx).map(|r| r.net_price).unwrap_or(Decimal::ZERO)
    }

    /// Bids crossing `ask_net`, best (highest net) first
    fn crossing_bids(&self, ask_net: Decimal) -> Vec<usize> {
        let mut bids: Vec<usize> = self
            .book
            .indices_of(Side::Bid)
            .into_iter()
            .filter(|&i| self.net_price(i) > ask_net)
            .collect();
        bids.reverse();
        bids
    }

    /// Asks crossing `bid_net`, best (lowest net) first
    fn crossing_asks(&self, bid_net: Decimal) -> Vec<usize> {
        self.book
            .indices_of(Side::Ask)
            .into_iter()
            .filter(|&i| self.net_price(i) < bid_net)
            .collect()
    }

    fn ask_major_sweep(&mut self) {
        for ask in self.book.indices_of(Side::Ask) {
            if self.book.remaining(ask).is_zero() {
                continue;
            }

            for bid in self.crossing_bids(self.net_price(ask)) {
                if self.cross(ask, bid).is_some() {
                    break;
                }
            }

            if self.book.remaining(ask).is_zero() {
                break;
            }
        }
    }

    fn bid_major_sweep(&mut self) {
        for bid in self.book.indices_of(Side::Bid) {
            if self.book.remaining(bid).is_zero() {
                continue;
            }

            for ask in self.crossing_asks(self.net_price(bid)) {
                if self.cross(ask, bid).is_some() {
                    break;
                }
            }

            if self.book.remaining(bid).is_zero() {
                break;
            }
        }
    }

    fn exhaustive_pass(&mut self) {
        for ask in self.book.indices_of(Side::Ask) {
            for bid in self.crossing_bids(self.net_price(ask)) {
                if self.book.remaining(ask).is_zero() {
                    break;
                }
                self.cross(ask, bid);
            }
        }
    }

    /// Match as much as both records allow.
    ///
    /// Returns the matched quantity, or `None` when either side was already
    /// empty. A successful match always exhausts at least one side.
    fn cross(&mut self, ask: usize, bid: usize) -> Option<Decimal> {
        let matched = self.book.remaining(ask).min(self.book.remaining(bid));
        if matched <= Decimal::ZERO {
            return None;
        }

        self.book.fill(ask, matched);
        self.book.fill(bid, matched);

        let (Some(ask_rec), Some(bid_rec)) = (self.book.get(ask), self.book.get(bid)) else {
            return None;
        };

        self.report.profit += matched * (bid_rec.net_price - ask_rec.net_price);
        self.report
            .inventory
            .record_bid_fill(&bid_rec.venue, bid_rec.net_price, matched);
        self.report
            .inventory
            .record_ask_fill(&ask_rec.venue, ask_rec.net_price, matched);

        self.report
            .legs
            .push(MatchedTradeLeg::from_record(ask_rec, matched, self.timestamp));
        self.report
            .legs
            .push(MatchedTradeLeg::from_record(bid_rec, matched, self.timestamp));

        tracing::debug!(
            ask_venue = %ask_rec.venue,
            bid_venue = %bid_rec.venue,
            ask_net = %ask_rec.net_price,
            bid_net = %bid_rec.net_price,
            matched = %matched,
            "Matched"
        );

        Some(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InventoryDelta, Venue};
    use crate::test_utils::{dec, record, record_with_net, test_timestamp};

    fn run(book: &mut OrderBook, strategy: MatchStrategy) -> MatchReport {
        MatchingEngine::new(strategy).run(book, test_timestamp())
    }

    #[test]
    fn test_single_cross() {
        let mut book = OrderBook::from_records(vec![
            record_with_net("89", "3", Side::Ask, "Kraken", "90"),
            record_with_net("101", "5", Side::Bid, "Coinmetro", "100"),
        ]);

        let report = run(&mut book, MatchStrategy::TwoSweep);

        assert_eq!(report.legs.len(), 2);
        assert_eq!(report.match_count(), 1);
        let (ask_leg, bid_leg) = (&report.legs[0], &report.legs[1]);
        assert_eq!(ask_leg.side, Side::Ask);
        assert_eq!(bid_leg.side, Side::Bid);
        assert_eq!(ask_leg.matched_quantity, dec("3"));
        assert_eq!(bid_leg.matched_quantity, dec("3"));
        assert_eq!(ask_leg.remaining_quantity, Decimal::ZERO);
        assert_eq!(bid_leg.remaining_quantity, dec("2"));
        assert_eq!(ask_leg.quantity, dec("3"));
        assert_eq!(bid_leg.quantity, dec("5"));
        assert_eq!(report.profit, dec("30"));

        assert_eq!(
            report.inventory.get(&Venue::from("Kraken")),
            InventoryDelta { base: dec("3"), quote: dec("-270") }
        );
        assert_eq!(
            report.inventory.get(&Venue::from("Coinmetro")),
            InventoryDelta { base: dec("-3"), quote: dec("300") }
        );

        assert_eq!(book.remaining(0), Decimal::ZERO);
        assert_eq!(book.remaining(1), dec("2"));
    }

    #[test]
    fn test_no_cross_no_legs() {
        let mut book = OrderBook::from_records(vec![
            record("100", "1", Side::Bid, "A"),
            record("101", "1", Side::Ask, "B"),
        ]);
        let report = run(&mut book, MatchStrategy::TwoSweep);
        assert!(report.legs.is_empty());
        assert_eq!(report.profit, Decimal::ZERO);
        assert!(report.inventory.is_empty());
    }

    #[test]
    fn test_equal_net_prices_do_not_cross() {
        let mut book = OrderBook::from_records(vec![
            record("100", "1", Side::Ask, "A"),
            record("100", "1", Side::Bid, "B"),
        ]);
        assert!(run(&mut book, MatchStrategy::TwoSweep).legs.is_empty());
    }

    #[test]
    fn test_ask_takes_best_bid_first() {
        let mut book = OrderBook::from_records(vec![
            record("90", "1", Side::Ask, "A"),
            record("95", "1", Side::Bid, "B"),
            record("99", "1", Side::Bid, "C"),
        ]);
        let report = run(&mut book, MatchStrategy::TwoSweep);
        assert_eq!(report.legs[1].price, dec("99"));
        assert_eq!(report.profit, dec("9"));
    }

    #[test]
    fn test_zero_remaining_records_are_skipped() {
        let mut book = OrderBook::from_records(vec![
            record("90", "2", Side::Ask, "A"),
            record("91", "2", Side::Ask, "A"),
            record("99", "2", Side::Bid, "B"),
        ]);
        book.set_remaining(0, Decimal::ZERO);

        let report = run(&mut book, MatchStrategy::TwoSweep);
        assert_eq!(report.match_count(), 1);
        assert_eq!(report.legs[0].price, dec("91"));
        assert_eq!(report.profit, dec("16"));
    }

    #[test]
    fn test_bid_sweep_mops_up_residual_volume() {
        // Sweep A: ask 90 (qty 1) takes bid 100 and is used up, ending the sweep.
        // Sweep B: bid 95 (lowest) takes ask 92; bid 100 is already empty.
        let mut book = OrderBook::from_records(vec![
            record("90", "1", Side::Ask, "A"),
            record("92", "1", Side::Ask, "A"),
            record("95", "1", Side::Bid, "B"),
            record("100", "1", Side::Bid, "B"),
        ]);

        let report = run(&mut book, MatchStrategy::TwoSweep);

        assert_eq!(report.match_count(), 2);
        assert_eq!(report.legs[0].price, dec("90"));
        assert_eq!(report.legs[1].price, dec("100"));
        assert_eq!(report.legs[2].price, dec("92"));
        assert_eq!(report.legs[3].price, dec("95"));
        assert_eq!(report.profit, dec("13"));
        assert!(book.iter().all(|r| r.remaining_quantity.is_zero()));
    }

    #[test]
    fn test_two_sweep_can_leave_crossing_volume() {
        // Sweep A: ask 90 fills 1 of bid 100 and is used up.
        // Sweep B: bid 98 (first in book order) takes ask 91 fully and is
        // used up, which ends the sweep with bid 100 still crossing ask 92.
        let mut book = OrderBook::from_records(vec![
            record("90", "1", Side::Ask, "A"),
            record("91", "2", Side::Ask, "A"),
            record("92", "2", Side::Ask, "A"),
            record("98", "2", Side::Bid, "B"),
            record("100", "3", Side::Bid, "B"),
        ]);

        let report = run(&mut book, MatchStrategy::TwoSweep);
        assert_eq!(report.match_count(), 2);
        assert_eq!(book.remaining(2), dec("2"));
        assert_eq!(book.remaining(4), dec("2"));

        let mut book = OrderBook::from_records(vec![
            record("90", "1", Side::Ask, "A"),
            record("91", "2", Side::Ask, "A"),
            record("92", "2", Side::Ask, "A"),
            record("98", "2", Side::Bid, "B"),
            record("100", "3", Side::Bid, "B"),
        ]);
        let exhaustive = run(&mut book, MatchStrategy::Exhaustive);
        assert!(exhaustive.profit >= report.profit);
        assert_eq!(book.remaining(4), Decimal::ZERO);
    }

    #[test]
    fn test_exhaustive_leaves_nothing_crossing() {
        let mut book = OrderBook::from_records(vec![
            record("90", "4", Side::Ask, "A"),
            record("93", "1", Side::Ask, "B"),
            record("94", "1", Side::Bid, "A"),
            record("96", "2", Side::Bid, "B"),
            record("97", "3", Side::Bid, "A"),
        ]);
        run(&mut book, MatchStrategy::Exhaustive);

        for ask in book.iter().filter(|r| r.side.is_ask() && !r.is_exhausted()) {
            assert!(book
                .iter()
                .filter(|b| b.side.is_bid() && b.net_price > ask.net_price)
                .all(|b| b.is_exhausted()));
        }
    }

    #[test]
    fn test_legs_are_stamped() {
        let mut book = OrderBook::from_records(vec![
            record("90", "1", Side::Ask, "A"),
            record("99", "1", Side::Bid, "B"),
        ]);
        let report = run(&mut book, MatchStrategy::TwoSweep);
        assert!(report.legs.iter().all(|l| l.timestamp == test_timestamp()));
    }
}
