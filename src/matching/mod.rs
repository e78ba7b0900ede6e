//! Matching stage of a cycle
//!
//! - Reconciliation of the fresh book against today's fills
//! - Fee-aware crossing of bids against asks

pub mod engine;
pub mod reconcile;

pub use engine::{MatchReport, MatchStrategy, MatchingEngine};
pub use reconcile::{DedupePolicy, FillReconciler};
