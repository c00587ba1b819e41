use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::market::{MarketData, MarketOrder, MarketSummary};

/// Coins shown when no count is given.
pub const DEFAULT_LEADERBOARD_SIZE: u32 = 25;

/// Largest page the markets endpoint serves.
pub const MAX_LEADERBOARD_SIZE: u32 = 250;

/// One leaderboard line. `rank` is the 1-based position in the listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub name: String,
    pub symbol: String,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
}

/// Number rows by their position in `markets`.
pub fn rank_markets(markets: &[MarketSummary]) -> Vec<LeaderboardRow> {
    markets
        .iter()
        .enumerate()
        .map(|(idx, m)| LeaderboardRow {
            rank: idx + 1,
            name: m.name.clone(),
            symbol: m.symbol.to_uppercase(),
            price: m.current_price,
            market_cap: m.market_cap,
            volume_24h: m.total_volume,
        })
        .collect()
}

/// Fetch the first `count` coins in `order` and rank them.
pub async fn fetch_leaderboard(
    client: &dyn MarketData,
    currency: &str,
    order: MarketOrder,
    count: u32,
) -> Result<Vec<LeaderboardRow>> {
    if !(1..=MAX_LEADERBOARD_SIZE).contains(&count) {
        return Err(Error::Config(format!(
            "leaderboard size must be between 1 and {MAX_LEADERBOARD_SIZE}"
        )));
    }

    info!(
        currency,
        order = order.as_str(),
        count,
        "fetching leaderboard"
    );
    let markets = client.get_coins_markets(currency, order, count, 1).await?;
    if markets.is_empty() {
        return Err(Error::NoResults);
    }

    Ok(rank_markets(&markets))
}
