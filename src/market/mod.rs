pub mod coingecko;
#[cfg(test)]
pub(crate) mod fake;
pub mod memo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Current price of one coin as returned by the simple price endpoint.
///
/// `price` is `None` when the API omitted the coin or the requested currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub id: String,
    pub price: Option<f64>,
}

/// A single raw market-chart sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub price: f64,
}

/// One entry of the markets listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub market_cap_rank: Option<u32>,
}

/// Coin detail with market data already narrowed to one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub market_cap_rank: Option<u32>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
}

/// One entry of the full coin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// Sort order accepted by the markets listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarketOrder {
    MarketCapDesc,
    MarketCapAsc,
    VolumeDesc,
    VolumeAsc,
    IdAsc,
    IdDesc,
}

impl MarketOrder {
    /// Render the order as the API query value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarketCapDesc => "market_cap_desc",
            Self::MarketCapAsc => "market_cap_asc",
            Self::VolumeDesc => "volume_desc",
            Self::VolumeAsc => "volume_asc",
            Self::IdAsc => "id_asc",
            Self::IdDesc => "id_desc",
        }
    }
}

/// Capabilities the dashboard consumes from a market-data API.
///
/// Every view receives an implementation explicitly; tests substitute fakes.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Current prices for `ids`, one quote per requested id in request order.
    async fn get_price(&self, ids: &[String], currency: &str) -> Result<Vec<PriceQuote>>;

    /// Raw `(timestamp, price)` samples for the trailing `days`.
    async fn get_market_chart(
        &self,
        id: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>>;

    /// One page of the markets listing.
    async fn get_coins_markets(
        &self,
        currency: &str,
        order: MarketOrder,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<MarketSummary>>;

    /// Coin detail with market data for `currency`.
    async fn get_coin_by_id(&self, id: &str, currency: &str) -> Result<CoinDetail>;

    /// Every coin the provider knows about.
    async fn get_coins_list(&self) -> Result<Vec<CoinListing>>;
}

/// Title-case a coin id for display when no name is known.
pub fn display_name_for(id: &str) -> String {
    id.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
