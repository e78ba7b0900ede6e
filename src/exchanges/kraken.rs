//! Kraken REST order-book client
//!
//! API: GET https://api.kraken.com/0/public/Depth?pair={pair}&count={depth}
//! Response:
//! ```json
//! {"error": [], "result": {"XXBTZEUR": {
//!     "bids": [["23423.09000", "1.200", 1702311080], ...],
//!     "asks": [["23425.01000", "0.058", 1702311076], ...]}}}
//! ```

use crate::core::Venue;
use crate::exchanges::parsing::{RawLevel, RawVenueBook};
use crate::exchanges::traits::{FetchError, QuoteSource};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Kraken order-book client
pub struct KrakenClient {
    venue: Venue,
    client: reqwest::Client,
    base_url: String,
    pair: String,
    depth: u32,
}

impl KrakenClient {
    pub const BASE_URL: &'static str = "https://api.kraken.com";

    pub fn new(venue: Venue, client: reqwest::Client, base_url: &str, pair: &str, depth: u32) -> Self {
        Self {
            venue,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pair: pair.to_string(),
            depth,
        }
    }

    pub fn depth_url(&self) -> String {
        format!(
            "{}/0/public/Depth?pair={}&count={}",
            self.base_url, self.pair, self.depth
        )
    }

    pub fn asset_pairs_url(&self) -> String {
        format!("{}/0/public/AssetPairs?pair={}", self.base_url, self.pair)
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(&self.venue, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                venue: self.venue.clone(),
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::network(&self.venue, e))
    }

    /// Taker fee rate of the lowest volume tier (0.0026 = 0.26%)
    pub async fn fetch_taker_fee(&self) -> Result<Decimal, FetchError> {
        let body = self.get_text(&self.asset_pairs_url()).await?;
        Self::parse_taker_fee(&self.venue, &body)
    }

    /// Decode a Depth response body
    pub fn parse_depth(venue: &Venue, body: &str) -> Result<RawVenueBook, FetchError> {
        let response: KrakenResponse<HashMap<String, KrakenDepth>> =
            serde_json::from_str(body).map_err(|e| FetchError::malformed(venue, e))?;
        let result = response.into_result(venue)?;

        // The result is keyed by Kraken's canonical pair name, which may
        // differ from the requested alias
        let depth = result
            .into_values()
            .next()
            .ok_or_else(|| FetchError::malformed(venue, "empty result"))?;

        Ok(RawVenueBook::new(venue.clone(), depth.bids, depth.asks))
    }

    /// Decode an AssetPairs response body into the first taker fee tier
    pub fn parse_taker_fee(venue: &Venue, body: &str) -> Result<Decimal, FetchError> {
        let response: KrakenResponse<HashMap<String, KrakenAssetPair>> =
            serde_json::from_str(body).map_err(|e| FetchError::malformed(venue, e))?;
        let result = response.into_result(venue)?;

        let pair = result
            .into_values()
            .next()
            .ok_or_else(|| FetchError::malformed(venue, "empty result"))?;

        // Tiers are [volume, percent]
        let percent = pair
            .fees
            .first()
            .and_then(|tier| tier.get(1))
            .and_then(|p| p.to_decimal())
            .ok_or_else(|| FetchError::malformed(venue, "no fee tiers"))?;

        Ok(percent / Decimal::ONE_HUNDRED)
    }
}

impl QuoteSource for KrakenClient {
    fn venue(&self) -> &Venue {
        &self.venue
    }

    async fn fetch(&self) -> Result<RawVenueBook, FetchError> {
        let url = self.depth_url();
        crate::log_venue!(tracing::Level::DEBUG, url = %url, "Fetching Kraken book");

        let body = self.get_text(&url).await?;
        Self::parse_depth(&self.venue, &body)
    }
}

// === API Response Types ===

#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

impl<T> KrakenResponse<T> {
    fn into_result(self, venue: &Venue) -> Result<T, FetchError> {
        if !self.error.is_empty() {
            return Err(FetchError::Api {
                venue: venue.clone(),
                message: self.error.join(", "),
            });
        }
        self.result
            .ok_or_else(|| FetchError::malformed(venue, "missing 'result'"))
    }
}

#[derive(Debug, Deserialize)]
struct KrakenDepth {
    #[serde(default)]
    bids: Vec<RawLevel>,
    #[serde(default)]
    asks: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
struct KrakenAssetPair {
    #[serde(default)]
    fees: Vec<Vec<crate::exchanges::parsing::RawNumber>>,
}
