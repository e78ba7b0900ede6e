//! Fee-aware cross-venue arbitrage matcher
//!
//! Polls order books from several venues, merges them into one book priced
//! net of each venue's fee, and greedily crosses bids against asks while
//! remembering what was already matched today.

pub mod core;
pub mod engine;
pub mod exchanges;
pub mod infrastructure;
pub mod ledger;
pub mod matching;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use infrastructure::config::{Config, ConfigError};

use thiserror::Error;

/// Main error type for the matcher
#[derive(Error, Debug)]
pub enum ArbError {
    #[error("Venue fetch failed: {0}")]
    Fetch(#[from] exchanges::FetchError),

    #[error("Fee lookup failed: {0}")]
    Fee(#[from] core::FeeError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArbError {
    /// True when the error only spoils the current cycle and polling can
    /// go on; false when the process should stop.
    pub fn is_cycle_fatal(&self) -> bool {
        match self {
            ArbError::Fetch(_) | ArbError::Fee(_) => true,
            ArbError::Ledger(e) => !e.is_schema(),
            ArbError::Config(_) | ArbError::Io(_) => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ArbError>;
