//! Coinmetro REST order-book client
//!
//! API: GET https://api.coinmetro.com/exchange/book/{pair}
//! Response: `{"book": {"bid": {"<price>": <qty>, ...}, "ask": {...}, ...}}`

use crate::core::Venue;
use crate::exchanges::parsing::{RawLevel, RawNumber, RawVenueBook};
use crate::exchanges::traits::{FetchError, QuoteSource};
use serde::Deserialize;

/// Coinmetro order-book client
pub struct CoinmetroClient {
    venue: Venue,
    client: reqwest::Client,
    url: String,
}

impl CoinmetroClient {
    pub const BASE_URL: &'static str = "https://api.coinmetro.com";

    pub fn new(venue: Venue, client: reqwest::Client, base_url: &str, pair: &str) -> Self {
        Self {
            venue,
            client,
            url: format!("{}/exchange/book/{}", base_url.trim_end_matches('/'), pair),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decode a response body into raw levels
    pub fn parse_body(venue: &Venue, body: &str) -> Result<RawVenueBook, FetchError> {
        let response: CoinmetroBookResponse =
            serde_json::from_str(body).map_err(|e| FetchError::malformed(venue, e))?;

        let book = response
            .book
            .ok_or_else(|| FetchError::malformed(venue, "'book' key not found"))?;

        Ok(RawVenueBook::new(
            venue.clone(),
            Self::levels(book.bid),
            Self::levels(book.ask),
        ))
    }

    /// Price keys map to sizes; keep the order the venue used
    fn levels(side: Vec<(String, RawNumber)>) -> Vec<RawLevel> {
        side.into_iter()
            .map(|(price, qty)| RawLevel(vec![RawNumber::Text(price), qty]))
            .collect()
    }
}

impl QuoteSource for CoinmetroClient {
    fn venue(&self) -> &Venue {
        &self.venue
    }

    async fn fetch(&self) -> Result<RawVenueBook, FetchError> {
        crate::log_venue!(tracing::Level::DEBUG, url = %self.url, "Fetching Coinmetro book");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::network(&self.venue, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                venue: self.venue.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(&self.venue, e))?;

        Self::parse_body(&self.venue, &body)
    }
}

// === API Response Types ===

#[derive(Debug, Deserialize)]
struct CoinmetroBookResponse {
    book: Option<CoinmetroBook>,
}

#[derive(Debug, Deserialize)]
struct CoinmetroBook {
    #[serde(default, deserialize_with = "ordered_levels")]
    bid: Vec<(String, RawNumber)>,
    #[serde(default, deserialize_with = "ordered_levels")]
    ask: Vec<(String, RawNumber)>,
}

/// Read a JSON object of `price -> size` keeping entries in document order
fn ordered_levels<'de, D>(deserializer: D) -> Result<Vec<(String, RawNumber)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct LevelsVisitor;

    impl<'de> serde::de::Visitor<'de> for LevelsVisitor {
        type Value = Vec<(String, RawNumber)>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an object mapping price to size")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut levels = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((price, qty)) = map.next_entry::<String, RawNumber>()? {
                levels.push((price, qty));
            }
            Ok(levels)
        }
    }

    deserializer.deserialize_map(LevelsVisitor)
}
