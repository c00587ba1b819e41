//! Terminal crypto dashboard: portfolio valuation, daily price trends, coin
//! comparison, a market leaderboard, and a naive linear price projection,
//! backed by the CoinGecko market-data API.

pub mod compare;
pub mod config;
pub mod error;
pub mod forecast;
pub mod leaderboard;
pub mod market;
pub mod output;
pub mod portfolio;
pub mod search;
pub mod trend;
