//! Fill reconciliation
//!
//! Venues keep showing a resting quote until someone else takes it, so a
//! quote we already matched in an earlier cycle comes back unchanged in the
//! next snapshot. Reconciliation folds today's matched legs into the fresh
//! book so that already-filled volume is not matched twice.

use crate::core::{FillKey, MatchedTradeLeg, OrderBook};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do with records that are identical in every field after
/// reconciliation.
///
/// Collapsing is lossy: two distinct resting quotes with the same price,
/// quantity, side and venue become a single record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    /// Keep the first of each group of identical records
    #[default]
    CollapseExact,
    /// Keep every record
    KeepAll,
}

/// Applies persisted fills to the current cycle's book
#[derive(Debug, Clone, Copy, Default)]
pub struct FillReconciler {
    policy: DedupePolicy,
}

impl FillReconciler {
    pub fn new(policy: DedupePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DedupePolicy {
        self.policy
    }

    /// Reset remaining quantities to the full quantity, then clamp each
    /// record to the smallest remaining quantity recorded for the same
    /// `(price, quantity, side, venue)` in `history`.
    pub fn reconcile(&self, mut book: OrderBook, history: &[MatchedTradeLeg]) -> OrderBook {
        let filled = Self::lowest_remaining(history);

        for record in book.records_mut().iter_mut() {
            record.remaining_quantity = record.quantity;
            if let Some(&persisted) = filled.get(&record.fill_key()) {
                record.remaining_quantity = record
                    .remaining_quantity
                    .min(persisted)
                    .max(Decimal::ZERO);
            }
        }

        if self.policy == DedupePolicy::CollapseExact {
            Self::collapse_duplicates(&mut book);
        }

        book
    }

    /// Lowest persisted remaining quantity per quote identity
    fn lowest_remaining(history: &[MatchedTradeLeg]) -> HashMap<FillKey, Decimal> {
        let mut filled: HashMap<FillKey, Decimal> = HashMap::with_capacity(history.len());
        for leg in history {
            let key = FillKey {
                price: leg.price,
                quantity: leg.quantity,
                side: leg.side,
                venue: leg.venue.clone(),
            };
            filled
                .entry(key)
                .and_modify(|r| *r = (*r).min(leg.remaining_quantity))
                .or_insert(leg.remaining_quantity);
        }
        filled
    }

    /// Drop later records equal in every field to an earlier one.
    ///
    /// Identical records are adjacent or close in a net-price sorted book,
    /// but not necessarily contiguous, so compare against everything kept.
    fn collapse_duplicates(book: &mut OrderBook) {
        let records = book.records_mut();
        let mut kept: Vec<crate::core::OrderRecord> = Vec::with_capacity(records.len());
        for record in records.drain(..) {
            if !kept.contains(&record) {
                kept.push(record);
            }
        }
        *records = kept;
    }
}
