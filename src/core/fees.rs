//! Venue fee schedule and fee adjustment

use super::book::OrderBook;
use super::order::{OrderRecord, Quote, Venue};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Fee rate per venue (0.001 = 0.1%)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeSchedule {
    rates: HashMap<Venue, Decimal>,
}

impl FeeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same rate for every listed venue
    pub fn uniform(venues: &[Venue], rate: Decimal) -> Self {
        Self {
            rates: venues.iter().map(|v| (v.clone(), rate)).collect(),
        }
    }

    pub fn with_rate(mut self, venue: impl Into<Venue>, rate: Decimal) -> Self {
        self.set_rate(venue, rate);
        self
    }

    pub fn set_rate(&mut self, venue: impl Into<Venue>, rate: Decimal) {
        self.rates.insert(venue.into(), rate);
    }

    #[inline]
    pub fn rate(&self, venue: &Venue) -> Option<Decimal> {
        self.rates.get(venue).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Fee lookup failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    #[error("No fee rate configured for venue {0}")]
    UnknownVenue(Venue),
}

/// Attaches fees and net prices to merged quotes
pub struct FeeAdjuster;

impl FeeAdjuster {
    /// Compute fee and net price for every quote and re-sort by net price.
    ///
    /// The sort is stable, so quotes with equal net price keep their merged
    /// (raw price) order.
    pub fn apply(quotes: Vec<Quote>, fees: &FeeSchedule) -> Result<OrderBook, FeeError> {
        let records = quotes
            .into_iter()
            .map(|quote| {
                let rate = fees
                    .rate(&quote.venue)
                    .ok_or_else(|| FeeError::UnknownVenue(quote.venue.clone()))?;
                Ok(OrderRecord::from_quote(quote, rate))
            })
            .collect::<Result<Vec<_>, FeeError>>()?;

        Ok(OrderBook::from_records(records))
    }
}
