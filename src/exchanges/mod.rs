//! Venue-specific fetch adapters

pub mod coinmetro;
pub mod kraken;
pub mod parsing;
pub mod traits;

pub use coinmetro::CoinmetroClient;
pub use kraken::KrakenClient;
pub use parsing::{Normalized, Normalizer, RawLevel, RawNumber, RawVenueBook, RejectedQuote};
pub use traits::{FetchError, QuoteSource};

use crate::core::Venue;
use crate::infrastructure::config::VenueConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported venue APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    Coinmetro,
    Kraken,
}

impl VenueKind {
    pub fn name(&self) -> &'static str {
        match self {
            VenueKind::Coinmetro => "coinmetro",
            VenueKind::Kraken => "kraken",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            VenueKind::Coinmetro => CoinmetroClient::BASE_URL,
            VenueKind::Kraken => KrakenClient::BASE_URL,
        }
    }
}

/// Concrete venue client (static dispatch over adapters)
pub enum VenueClient {
    Coinmetro(CoinmetroClient),
    Kraken(KrakenClient),
}

impl VenueClient {
    /// Build the adapter described by `config`, sharing one HTTP client
    pub fn from_config(config: &VenueConfig, http: reqwest::Client) -> Self {
        let venue = Venue::new(config.name.clone());
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or_else(|| config.kind.default_base_url());

        match config.kind {
            VenueKind::Coinmetro => {
                VenueClient::Coinmetro(CoinmetroClient::new(venue, http, base_url, &config.pair))
            }
            VenueKind::Kraken => VenueClient::Kraken(KrakenClient::new(
                venue,
                http,
                base_url,
                &config.pair,
                config.depth,
            )),
        }
    }

    pub fn kind(&self) -> VenueKind {
        match self {
            VenueClient::Coinmetro(_) => VenueKind::Coinmetro,
            VenueClient::Kraken(_) => VenueKind::Kraken,
        }
    }

    /// Fee rate published by the venue, when the venue exposes one
    pub async fn fetch_fee_rate(&self) -> Option<Result<Decimal, FetchError>> {
        match self {
            VenueClient::Coinmetro(_) => None,
            VenueClient::Kraken(c) => Some(c.fetch_taker_fee().await),
        }
    }
}

impl QuoteSource for VenueClient {
    fn venue(&self) -> &Venue {
        match self {
            VenueClient::Coinmetro(c) => c.venue(),
            VenueClient::Kraken(c) => c.venue(),
        }
    }

    async fn fetch(&self) -> Result<RawVenueBook, FetchError> {
        match self {
            VenueClient::Coinmetro(c) => c.fetch().await,
            VenueClient::Kraken(c) => c.fetch().await,
        }
    }
}

/// Shared HTTP client for all venue adapters
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("cross-venue-arb/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Fetch every venue concurrently.
///
/// Fails fast: the first error is returned and the remaining requests are
/// dropped, which cancels them. Dropping the returned future cancels all of
/// them as well.
pub async fn fetch_all<S: QuoteSource>(sources: &[S]) -> Result<Vec<RawVenueBook>, FetchError> {
    futures_util::future::try_join_all(sources.iter().map(|s| s.fetch())).await
}
