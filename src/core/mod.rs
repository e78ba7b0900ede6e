//! Core types for the cross-venue book
//!
//! This module contains the data model shared by every stage of a cycle:
//! - Quote / OrderRecord: normalized and fee-adjusted resting quotes
//! - OrderBook: the net-price ordered arena the matcher mutates
//! - BookAssembler / FeeAdjuster: merge, fee, trim and spread
//! - MatchedTradeLeg / InventoryLedger: what a cycle produces

pub mod book;
pub mod fees;
pub mod order;
pub mod trade;

pub use book::{BookAssembler, OrderBook, SpreadReport};
pub use fees::{FeeAdjuster, FeeError, FeeSchedule};
pub use order::{FillKey, OrderRecord, Quote, Side, Venue};
pub use trade::{InventoryDelta, InventoryLedger, MatchedTradeLeg};
