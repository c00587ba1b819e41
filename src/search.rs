//! Look up any listed coin by name and show its statistics and trend.

use serde::Serialize;
use tracing::{info, warn};

use crate::compare::CoinStats;
use crate::error::{Error, FetchFailure, Result};
use crate::market::memo::ReferenceCache;
use crate::market::{CoinListing, MarketData};
use crate::trend::{CoinRef, TrendReport, collect_daily_trends};

/// Maximum number of "did you mean" names offered for a failed lookup.
pub const MAX_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub coin: CoinListing,
    /// Absent when the detail fetch failed; see `detail_failure`.
    pub stats: Option<CoinStats>,
    pub detail_failure: Option<FetchFailure>,
    pub trends: TrendReport,
}

/// Exact match by name, then id, then ticker symbol, all case-insensitive.
pub fn find_coin<'a>(coins: &'a [CoinListing], query: &str) -> Option<&'a CoinListing> {
    let needle = query.trim();
    if needle.is_empty() {
        return None;
    }

    let same = |field: &str| field.eq_ignore_ascii_case(needle);
    coins
        .iter()
        .find(|c| same(&c.name))
        .or_else(|| coins.iter().find(|c| same(&c.id)))
        .or_else(|| coins.iter().find(|c| same(&c.symbol)))
}

/// Names containing `query`, shortest first, at most `limit` of them.
pub fn suggest<'a>(coins: &'a [CoinListing], query: &str, limit: usize) -> Vec<&'a CoinListing> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<&CoinListing> = coins
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect();
    hits.sort_by(|a, b| {
        a.name
            .len()
            .cmp(&b.name.len())
            .then_with(|| a.name.cmp(&b.name))
    });
    hits.truncate(limit);
    hits
}

/// Resolve `query` against the coin list, then fetch detail and trend.
pub async fn search_coin(
    client: &dyn MarketData,
    reference: &ReferenceCache,
    query: &str,
    currency: &str,
    lookback_days: u32,
) -> Result<SearchOutcome> {
    let coins = reference.coins_list(client).await?;
    let Some(coin) = find_coin(&coins, query).cloned() else {
        let hints = suggest(&coins, query, MAX_SUGGESTIONS);
        if hints.is_empty() {
            return Err(Error::NoResults);
        }
        let names: Vec<&str> = hints.iter().map(|c| c.name.as_str()).collect();
        return Err(Error::Config(format!(
            "no coin named '{}' -- did you mean: {}",
            query.trim(),
            names.join(", ")
        )));
    };

    info!(id = %coin.id, currency, "fetching coin detail");
    let (stats, detail_failure) = match client.get_coin_by_id(&coin.id, currency).await {
        Ok(detail) => (Some(CoinStats::from_detail(&coin.name, &detail)), None),
        Err(err) => {
            warn!(id = %coin.id, error = %err, "coin detail fetch failed");
            (None, Some(FetchFailure::new(&coin.id, "coin_by_id", &err)))
        }
    };

    let trends = collect_daily_trends(
        client,
        &[CoinRef::new(&coin.id, &coin.name)],
        currency,
        lookback_days,
    )
    .await;

    Ok(SearchOutcome {
        coin,
        stats,
        detail_failure,
        trends,
    })
}
