//! Side-by-side statistics and trends for two coins.

use futures::future::join;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::market::memo::ReferenceCache;
use crate::market::{CoinDetail, MarketData, MarketSummary};
use crate::trend::{CoinRef, TrendReport, collect_daily_trends};

/// Headline market statistics for one coin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinStats {
    pub id: String,
    pub name: String,
    /// Upper-cased ticker.
    pub symbol: String,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub rank: Option<u32>,
}

impl CoinStats {
    /// Build stats from a detail response, labelled with `name`.
    pub fn from_detail(name: &str, detail: &CoinDetail) -> Self {
        Self {
            id: detail.id.clone(),
            name: name.to_string(),
            symbol: detail.symbol.to_uppercase(),
            price: detail.current_price,
            market_cap: detail.market_cap,
            volume_24h: detail.total_volume,
            rank: detail.market_cap_rank,
        }
    }

    /// True when the detail response carried no market figures at all.
    pub fn lacks_market_data(&self) -> bool {
        self.price.is_none() && self.market_cap.is_none() && self.volume_24h.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub first: CoinStats,
    pub second: CoinStats,
    pub trends: TrendReport,
}

/// Find `query` among the candidate coins by id or name, ignoring case.
pub fn resolve_choice<'a>(choices: &'a [MarketSummary], query: &str) -> Result<&'a MarketSummary> {
    let needle = query.trim();
    let same = |field: &str| field.eq_ignore_ascii_case(needle);
    choices
        .iter()
        .find(|c| same(&c.id))
        .or_else(|| choices.iter().find(|c| same(&c.name)))
        .ok_or_else(|| {
            let top = choices.len();
            Error::Config(format!(
                "'{needle}' is not among the top {top} coins by market cap \
                 (run `coindash leaderboard --count {top}` to list them)"
            ))
        })
}

/// Compare two distinct coins chosen from the top coins by market cap.
///
/// Both current prices are required. A failed trend fetch is reported in the
/// returned [`TrendReport`] while the statistics still come back.
pub async fn compare_coins(
    client: &dyn MarketData,
    reference: &ReferenceCache,
    first: &str,
    second: &str,
    currency: &str,
    lookback_days: u32,
) -> Result<Comparison> {
    let choices = reference.top_coins(client, currency).await?;
    let a = resolve_choice(&choices, first)?;
    let b = resolve_choice(&choices, second)?;

    if a.id == b.id {
        return Err(Error::Config(
            "please select two different cryptocurrencies".into(),
        ));
    }

    info!(first = %a.id, second = %b.id, currency, "comparing coins");
    let (detail_a, detail_b) = join(
        client.get_coin_by_id(&a.id, currency),
        client.get_coin_by_id(&b.id, currency),
    )
    .await;

    let first = CoinStats::from_detail(&a.name, &detail_a?);
    let second = CoinStats::from_detail(&b.name, &detail_b?);

    if first.price.is_none() || second.price.is_none() {
        warn!(first = %a.id, second = %b.id, "comparison missing current price");
        return Err(Error::MissingData("could not retrieve pricing data".into()));
    }

    let coins = [CoinRef::new(&a.id, &a.name), CoinRef::new(&b.id, &b.name)];
    let trends = collect_daily_trends(client, &coins, currency, lookback_days).await;

    Ok(Comparison {
        first,
        second,
        trends,
    })
}
