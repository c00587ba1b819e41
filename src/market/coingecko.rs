use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use super::{
    CoinDetail, CoinListing, MarketData, MarketOrder, MarketSummary, PricePoint, PriceQuote,
};
use crate::error::{Error, Result};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko market-data client -- free public API, demo key optional.
pub struct CoinGecko {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGecko {
    /// Create a client for the production API.
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Create a client against a custom base URL (mirrors, mock servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = match Client::builder()
            .user_agent(concat!("coindash/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "HTTP client builder failed, using default client");
                Client::new()
            }
        };
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Attach a demo API key sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.trim().is_empty()).then(|| key.trim().to_string());
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, query = ?query, operation, "requesting CoinGecko");

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        debug!(status = %status, body_len = body.len(), operation, "CoinGecko response");
        trace!(body = %body, operation, "CoinGecko response body");

        if !status.is_success() {
            return Err(Error::Api(format!(
                "CoinGecko returned {} for {}: {}",
                status, operation, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("CoinGecko {operation} JSON: {e}")))
    }
}

impl Default for CoinGecko {
    fn default() -> Self {
        Self::new()
    }
}

/// `/simple/price` response shape.
/// Example: `{ "bitcoin": { "usd": 50000 }, "ethereum": {} }`
type SimplePrice = HashMap<String, HashMap<String, Option<f64>>>;

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, Option<f64>)>,
}

#[derive(Debug, Deserialize)]
struct MarketsEntry {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    market_cap_rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    market_cap_rank: Option<u32>,
    market_data: Option<CoinMarketData>,
}

/// Per-currency figures nested under `market_data`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CoinMarketData {
    current_price: HashMap<String, Option<f64>>,
    market_cap: HashMap<String, Option<f64>>,
    total_volume: HashMap<String, Option<f64>>,
}

#[async_trait]
impl MarketData for CoinGecko {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn get_price(&self, ids: &[String], currency: &str) -> Result<Vec<PriceQuote>> {
        let cur = currency.to_lowercase();
        for id in ids {
            validate_id(id)?;
        }

        let data: SimplePrice = self
            .get_json(
                "/simple/price",
                &[("ids", ids.join(",")), ("vs_currencies", cur.clone())],
                "simple_price",
            )
            .await?;

        Ok(ids
            .iter()
            .map(|id| PriceQuote {
                id: id.clone(),
                price: data
                    .get(id.as_str())
                    .and_then(|prices| prices.get(&cur).copied().flatten())
                    .filter(|p| p.is_finite()),
            })
            .collect())
    }

    async fn get_market_chart(
        &self,
        id: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>> {
        validate_id(id)?;
        let payload: MarketChartResponse = self
            .get_json(
                &format!("/coins/{id}/market_chart"),
                &[
                    ("vs_currency", currency.to_lowercase()),
                    ("days", days.to_string()),
                ],
                "market_chart",
            )
            .await?;

        let mut points = Vec::with_capacity(payload.prices.len());
        for (ts_ms, price) in payload.prices {
            let Some(price) = price.filter(|p| p.is_finite()) else {
                continue;
            };

            if let Some(timestamp) =
                chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ts_ms as i64)
            {
                points.push(PricePoint { timestamp, price });
            }
        }

        debug!(id, days, samples = points.len(), "parsed market chart");
        Ok(points)
    }

    async fn get_coins_markets(
        &self,
        currency: &str,
        order: MarketOrder,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<MarketSummary>> {
        let entries: Vec<MarketsEntry> = self
            .get_json(
                "/coins/markets",
                &[
                    ("vs_currency", currency.to_lowercase()),
                    ("order", order.as_str().to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                    ("sparkline", "false".to_string()),
                ],
                "coins_markets",
            )
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| MarketSummary {
                id: e.id,
                symbol: e.symbol,
                name: e.name,
                current_price: e.current_price,
                market_cap: e.market_cap,
                total_volume: e.total_volume,
                market_cap_rank: e.market_cap_rank,
            })
            .collect())
    }

    async fn get_coin_by_id(&self, id: &str, currency: &str) -> Result<CoinDetail> {
        validate_id(id)?;
        let flag = |name: &'static str, on: bool| (name, on.to_string());
        let coin: CoinResponse = self
            .get_json(
                &format!("/coins/{id}"),
                &[
                    flag("localization", false),
                    flag("tickers", false),
                    flag("market_data", true),
                    flag("community_data", false),
                    flag("developer_data", false),
                    flag("sparkline", false),
                ],
                "coin_by_id",
            )
            .await?;

        let cur = currency.to_lowercase();
        let market = coin.market_data.unwrap_or_default();
        let pick = |m: &HashMap<String, Option<f64>>| m.get(&cur).copied().flatten();

        Ok(CoinDetail {
            id: coin.id,
            symbol: coin.symbol,
            name: coin.name,
            market_cap_rank: coin.market_cap_rank,
            current_price: pick(&market.current_price),
            market_cap: pick(&market.market_cap),
            total_volume: pick(&market.total_volume),
        })
    }

    async fn get_coins_list(&self) -> Result<Vec<CoinListing>> {
        let list: Vec<CoinListing> = self.get_json("/coins/list", &[], "coins_list").await?;
        if list.is_empty() {
            return Err(Error::NoResults);
        }
        Ok(list)
    }
}

/// Coin ids are interpolated into request paths, so only slug characters pass.
fn validate_id(id: &str) -> Result<()> {
    let ok = !id.is_empty() && id.chars().all(is_slug_char);
    if ok {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "invalid coin id '{id}' -- expected a CoinGecko id such as 'bitcoin'"
        )))
    }
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')
}
