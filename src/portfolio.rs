//! Holdings valuation for the portfolio view.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::HoldingConfig;
use crate::error::{Error, FetchFailure, Result};
use crate::market::{MarketData, PriceQuote, display_name_for};
use crate::trend::{CoinRef, TrendReport, collect_daily_trends};

/// Coins offered when the config does not list any, as `(name, id)`.
pub const DEFAULT_COINS: &[(&str, &str)] = &[
    ("Bitcoin", "bitcoin"),
    ("Ethereum", "ethereum"),
    ("Ripple", "ripple"),
    ("Litecoin", "litecoin"),
    ("Dogecoin", "dogecoin"),
    ("Cardano", "cardano"),
    ("Polkadot", "polkadot"),
    ("Chainlink", "chainlink"),
    ("Binance Coin", "binancecoin"),
    ("Solana", "solana"),
    ("Stellar", "stellar"),
    ("VeChain", "vechain"),
];

/// A coin the user holds (possibly zero of).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingEntry {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

impl HoldingEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, amount: f64) -> Result<Self> {
        let id = id.into();
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::Config(format!(
                "amount for '{id}' must be a non-negative number, got {amount}"
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            amount,
        })
    }
}

/// Valuation of one holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationRow {
    pub id: String,
    pub name: String,
    pub amount: f64,
    /// Zero when no quote was available.
    pub price: f64,
    pub value: f64,
    /// False when the price was missing and zero was substituted.
    pub quoted: bool,
}

/// Rows in holding order plus their total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Valuation {
    pub rows: Vec<ValuationRow>,
    pub total: f64,
}

/// Share of the portfolio held in one coin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSlice {
    pub name: String,
    pub value: f64,
    /// Fraction of the total, 0..=1.
    pub share: f64,
}

impl Valuation {
    /// Ids of holdings that were valued without a quote.
    pub fn unquoted(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| !r.quoted)
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Holdings with a positive value and their share of the total.
    pub fn distribution(&self) -> Vec<AllocationSlice> {
        self.rows
            .iter()
            .filter(|r| r.value > 0.0)
            .map(|r| AllocationSlice {
                name: r.name.clone(),
                value: r.value,
                share: if self.total > 0.0 {
                    r.value / self.total
                } else {
                    0.0
                },
            })
            .collect()
    }
}

/// Value each holding at its quoted price. Missing quotes count as zero.
pub fn value_holdings(holdings: &[HoldingEntry], quotes: &[PriceQuote]) -> Valuation {
    let prices: HashMap<&str, f64> = quotes
        .iter()
        .filter_map(|q| q.price.map(|p| (q.id.as_str(), p)))
        .collect();

    let rows: Vec<ValuationRow> = holdings
        .iter()
        .map(|h| {
            let quote = prices.get(h.id.as_str()).copied();
            let price = quote.unwrap_or(0.0);
            ValuationRow {
                id: h.id.clone(),
                name: h.name.clone(),
                amount: h.amount,
                price,
                value: h.amount * price,
                quoted: quote.is_some(),
            }
        })
        .collect();

    let total = rows.iter().map(|r| r.value).sum();
    Valuation { rows, total }
}

/// Build the holdings list from config entries (or the default coins), then
/// apply `overrides` in order. Overrides for unlisted coins are appended.
pub fn resolve_holdings(
    configured: &[HoldingConfig],
    overrides: &[(String, f64)],
) -> Result<Vec<HoldingEntry>> {
    let mut holdings = if configured.is_empty() {
        DEFAULT_COINS
            .iter()
            .map(|(name, id)| HoldingEntry::new(*id, *name, 0.0))
            .collect::<Result<Vec<_>>>()?
    } else {
        configured
            .iter()
            .map(|h| {
                let id = h.id.trim().to_lowercase();
                let name = h.name.clone().unwrap_or_else(|| display_name_for(&id));
                HoldingEntry::new(id, name, h.amount)
            })
            .collect::<Result<Vec<_>>>()?
    };

    for (id, amount) in overrides {
        match holdings.iter_mut().find(|h| &h.id == id) {
            Some(existing) => {
                *existing = HoldingEntry::new(id.clone(), existing.name.clone(), *amount)?;
            }
            None => {
                let name = display_name_for(id);
                holdings.push(HoldingEntry::new(id.clone(), name, *amount)?);
            }
        }
    }

    Ok(holdings)
}

/// Parse a `coin=amount` CLI argument.
pub fn parse_holding_arg(raw: &str) -> std::result::Result<(String, f64), String> {
    let (id, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COIN=AMOUNT, got '{raw}'"))?;

    let id = id.trim().to_lowercase();
    if id.is_empty() {
        return Err("coin id cannot be empty".to_string());
    }

    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("invalid amount '{}' for '{id}'", amount.trim()))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount for '{id}' must be non-negative"));
    }

    Ok((id, amount))
}

/// Everything the portfolio view shows.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub valuation: Valuation,
    /// Set when the price fetch failed and every price fell back to zero.
    pub price_failure: Option<FetchFailure>,
    pub trends: TrendReport,
}

/// Price every holding and chart the trend of each non-zero holding.
///
/// A failed price fetch does not abort the view: all prices fall back to zero
/// and the failure is reported alongside the valuation.
pub async fn analyze_portfolio(
    client: &dyn MarketData,
    holdings: &[HoldingEntry],
    currency: &str,
    lookback_days: u32,
) -> PortfolioReport {
    let ids: Vec<String> = holdings.iter().map(|h| h.id.clone()).collect();
    info!(coins = ids.len(), currency, "fetching portfolio prices");

    let (quotes, price_failure) = match client.get_price(&ids, currency).await {
        Ok(quotes) => (quotes, None),
        Err(err) => {
            warn!(error = %err, "price fetch failed, valuing holdings at zero");
            (Vec::new(), Some(FetchFailure::new(ids.join(","), "simple_price", &err)))
        }
    };

    let valuation = value_holdings(holdings, &quotes);
    if price_failure.is_none() {
        for id in valuation.unquoted() {
            warn!(id, "no price returned, valued at zero");
        }
    }

    let held: Vec<CoinRef> = holdings
        .iter()
        .filter(|h| h.amount > 0.0)
        .map(|h| CoinRef::new(&h.id, &h.name))
        .collect();
    let trends = collect_daily_trends(client, &held, currency, lookback_days).await;

    PortfolioReport {
        valuation,
        price_failure,
        trends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fake::{FakeMarket, point};

    fn holding(id: &str, amount: f64) -> HoldingEntry {
        HoldingEntry::new(id, display_name_for(id), amount).unwrap()
    }

    fn quote(id: &str, price: Option<f64>) -> PriceQuote {
        PriceQuote {
            id: id.to_string(),
            price,
        }
    }

    #[test]
    fn missing_price_values_at_zero_but_keeps_row() {
        let holdings = vec![holding("bitcoin", 2.0), holding("ethereum", 0.0)];
        let quotes = vec![quote("bitcoin", Some(50_000.0)), quote("ethereum", None)];

        let valuation = value_holdings(&holdings, &quotes);

        assert_eq!(valuation.rows.len(), 2);
        assert_eq!(valuation.rows[0].id, "bitcoin");
        assert_eq!(valuation.rows[0].amount, 2.0);
        assert_eq!(valuation.rows[0].price, 50_000.0);
        assert_eq!(valuation.rows[0].value, 100_000.0);
        assert!(valuation.rows[0].quoted);

        assert_eq!(valuation.rows[1].id, "ethereum");
        assert_eq!(valuation.rows[1].price, 0.0);
        assert_eq!(valuation.rows[1].value, 0.0);
        assert!(!valuation.rows[1].quoted);

        assert_eq!(valuation.total, 100_000.0);
        assert_eq!(valuation.unquoted(), vec!["ethereum"]);
    }

    #[test]
    fn rows_follow_holding_order_not_quote_order() {
        let holdings = vec![holding("solana", 1.0), holding("bitcoin", 1.0)];
        let quotes = vec![quote("bitcoin", Some(2.0)), quote("solana", Some(3.0))];

        let valuation = value_holdings(&holdings, &quotes);
        let ids: Vec<&str> = valuation.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["solana", "bitcoin"]);
        assert_eq!(valuation.total, 5.0);
    }

    #[test]
    fn amount_change_moves_total_by_delta_times_price() {
        let quotes = vec![quote("bitcoin", Some(40.0)), quote("cardano", Some(0.5))];
        let smaller = [holding("bitcoin", 1.0), holding("cardano", 10.0)];
        let larger = [holding("bitcoin", 1.0), holding("cardano", 14.0)];
        let before = value_holdings(&smaller, &quotes);
        let after = value_holdings(&larger, &quotes);

        assert!((after.total - before.total - 4.0 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn distribution_skips_zero_values() {
        let holdings = vec![
            holding("bitcoin", 1.0),
            holding("ethereum", 0.0),
            holding("solana", 3.0),
        ];
        let quotes = vec![
            quote("bitcoin", Some(30.0)),
            quote("ethereum", Some(100.0)),
            quote("solana", Some(10.0)),
        ];

        let slices = value_holdings(&holdings, &quotes).distribution();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "Bitcoin");
        assert!((slices[0].share - 0.5).abs() < 1e-9);
        assert_eq!(slices[1].name, "Solana");
        assert!((slices[1].share - 0.5).abs() < 1e-9);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(HoldingEntry::new("bitcoin", "Bitcoin", -1.0).is_err());
        assert!(HoldingEntry::new("bitcoin", "Bitcoin", f64::NAN).is_err());
    }

    #[test]
    fn parse_holding_arg_accepts_id_equals_amount() {
        assert_eq!(
            parse_holding_arg("Bitcoin=0.25").unwrap(),
            ("bitcoin".to_string(), 0.25)
        );
        assert!(parse_holding_arg("bitcoin").is_err());
        assert!(parse_holding_arg("=1").is_err());
        assert!(parse_holding_arg("bitcoin=abc").is_err());
        assert!(parse_holding_arg("bitcoin=-2").is_err());
    }

    #[test]
    fn resolve_holdings_defaults_then_overrides() {
        let overrides = vec![
            ("ethereum".to_string(), 1.5),
            ("shiba-inu".to_string(), 1e6),
        ];
        let holdings = resolve_holdings(&[], &overrides).unwrap();

        assert_eq!(holdings.len(), DEFAULT_COINS.len() + 1);
        assert_eq!(holdings[0].id, "bitcoin");
        assert_eq!(holdings[0].amount, 0.0);
        assert_eq!(holdings[1].amount, 1.5);
        assert_eq!(holdings[1].name, "Ethereum");
        let last = holdings.last().unwrap();
        assert_eq!(last.id, "shiba-inu");
        assert_eq!(last.name, "Shiba Inu");
    }

    #[test]
    fn resolve_holdings_uses_configured_list() {
        let configured = vec![HoldingConfig {
            id: " Monero ".to_string(),
            name: None,
            amount: 2.0,
        }];
        let holdings = resolve_holdings(&configured, &[]).unwrap();
        assert_eq!(holdings, vec![holding("monero", 2.0)]);

        let bad = vec![HoldingConfig {
            id: "monero".to_string(),
            name: None,
            amount: -2.0,
        }];
        assert!(resolve_holdings(&bad, &[]).is_err());
    }

    #[tokio::test]
    async fn analyze_degrades_when_price_fetch_fails() {
        let client =
            FakeMarket::default().with_chart("bitcoin", vec![point(1_700_000_000_000, 10.0)]);
        let holdings = vec![holding("bitcoin", 2.0), holding("ethereum", 0.0)];

        let report = analyze_portfolio(&client, &holdings, "usd", 30).await;

        assert_eq!(report.valuation.total, 0.0);
        assert_eq!(report.valuation.rows.len(), 2);
        let failure = report.price_failure.expect("failure recorded");
        assert_eq!(failure.operation, "simple_price");
        assert_eq!(report.trends.table.columns, vec!["Bitcoin"]);
    }

    #[tokio::test]
    async fn analyze_only_trends_non_zero_holdings() {
        let client = FakeMarket::default()
            .with_prices(&[("bitcoin", 50_000.0)])
            .with_chart("bitcoin", vec![point(1_700_000_000_000, 10.0)])
            .with_chart("ethereum", vec![point(1_700_000_000_000, 1.0)]);
        let holdings = vec![holding("bitcoin", 2.0), holding("ethereum", 0.0)];

        let report = analyze_portfolio(&client, &holdings, "usd", 30).await;

        assert!(report.price_failure.is_none());
        assert_eq!(report.valuation.total, 100_000.0);
        assert_eq!(report.trends.table.columns, vec!["Bitcoin"]);
        assert_eq!(
            client.chart_calls.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }
}
