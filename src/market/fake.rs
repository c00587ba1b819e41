//! In-memory `MarketData` used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{
    CoinDetail, CoinListing, MarketData, MarketOrder, MarketSummary, PricePoint, PriceQuote,
};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct FakeMarket {
    pub prices: Option<HashMap<String, f64>>,
    pub charts: HashMap<String, Vec<PricePoint>>,
    pub failing_charts: HashSet<String>,
    pub markets: Vec<MarketSummary>,
    pub details: HashMap<String, CoinDetail>,
    pub listings: Vec<CoinListing>,
    pub chart_calls: AtomicUsize,
    pub markets_calls: AtomicUsize,
}

impl FakeMarket {
    pub fn with_prices(mut self, prices: &[(&str, f64)]) -> Self {
        self.prices = Some(prices.iter().map(|(id, p)| (id.to_string(), *p)).collect());
        self
    }

    pub fn with_chart(mut self, id: &str, points: Vec<PricePoint>) -> Self {
        self.charts.insert(id.to_string(), points);
        self
    }

    pub fn with_failing_chart(mut self, id: &str) -> Self {
        self.failing_charts.insert(id.to_string());
        self
    }
}

pub fn point(ts_ms: i64, price: f64) -> PricePoint {
    PricePoint {
        timestamp: chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ts_ms)
            .expect("valid timestamp"),
        price,
    }
}

pub fn summary(id: &str, name: &str, price: Option<f64>) -> MarketSummary {
    MarketSummary {
        id: id.to_string(),
        symbol: id.chars().take(3).collect(),
        name: name.to_string(),
        current_price: price,
        market_cap: price.map(|p| p * 1_000.0),
        total_volume: price.map(|p| p * 10.0),
        market_cap_rank: None,
    }
}

pub fn detail(id: &str, name: &str, symbol: &str, price: Option<f64>) -> CoinDetail {
    CoinDetail {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        market_cap_rank: Some(1),
        current_price: price,
        market_cap: Some(1.0e12),
        total_volume: None,
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    fn name(&self) -> &str {
        "Fake"
    }

    async fn get_price(&self, ids: &[String], _currency: &str) -> Result<Vec<PriceQuote>> {
        let prices = self
            .prices
            .as_ref()
            .ok_or_else(|| Error::Api("price endpoint unavailable".into()))?;
        Ok(ids
            .iter()
            .map(|id| PriceQuote {
                id: id.clone(),
                price: prices.get(id).copied(),
            })
            .collect())
    }

    async fn get_market_chart(
        &self,
        id: &str,
        _currency: &str,
        _days: u32,
    ) -> Result<Vec<PricePoint>> {
        self.chart_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_charts.contains(id) {
            return Err(Error::Api(format!("chart for {id} unavailable")));
        }
        Ok(self.charts.get(id).cloned().unwrap_or_default())
    }

    async fn get_coins_markets(
        &self,
        _currency: &str,
        _order: MarketOrder,
        per_page: u32,
        _page: u32,
    ) -> Result<Vec<MarketSummary>> {
        self.markets_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .markets
            .iter()
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn get_coin_by_id(&self, id: &str, _currency: &str) -> Result<CoinDetail> {
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Api(format!("coin '{id}' not found")))
    }

    async fn get_coins_list(&self) -> Result<Vec<CoinListing>> {
        if self.listings.is_empty() {
            return Err(Error::NoResults);
        }
        Ok(self.listings.clone())
    }
}
