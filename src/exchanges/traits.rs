//! Venue abstraction traits
//!
//! Fetch adapters only have to produce a `RawVenueBook`; everything after
//! that (normalization, fees, matching) is venue-agnostic.

use crate::core::Venue;
use crate::exchanges::parsing::RawVenueBook;

/// Why a venue fetch failed.
///
/// Any of these aborts the current cycle; none of them stops the process.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("{venue}: network error: {message}")]
    Network { venue: Venue, message: String },

    #[error("{venue}: HTTP status {status}")]
    Http { venue: Venue, status: u16 },

    #[error("{venue}: malformed payload: {message}")]
    Malformed { venue: Venue, message: String },

    #[error("{venue}: venue error: {message}")]
    Api { venue: Venue, message: String },
}

impl FetchError {
    pub fn venue(&self) -> &Venue {
        match self {
            FetchError::Network { venue, .. }
            | FetchError::Http { venue, .. }
            | FetchError::Malformed { venue, .. }
            | FetchError::Api { venue, .. } => venue,
        }
    }

    pub(crate) fn network(venue: &Venue, err: impl std::fmt::Display) -> Self {
        FetchError::Network {
            venue: venue.clone(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(venue: &Venue, err: impl std::fmt::Display) -> Self {
        FetchError::Malformed {
            venue: venue.clone(),
            message: err.to_string(),
        }
    }
}

/// Source of order-book snapshots for one venue
///
/// # Design Notes
/// - Static dispatch through `VenueClient` in the engine
/// - `fetch()` must be cancel-safe: dropping the future abandons the request
#[allow(async_fn_in_trait)]
pub trait QuoteSource: Send + Sync {
    /// Venue identifier used in books and ledgers
    fn venue(&self) -> &Venue;

    /// Fetch the current bids and asks
    async fn fetch(&self) -> Result<RawVenueBook, FetchError>;
}
