//! Populated-once, read-many memoization for slow-changing reference data.
//!
//! The coin list and the top-coins listing are fetched at most once per key
//! and then shared. An optional TTL turns the memo into a time-boxed cache.
//! Concurrent refreshes may race; the last writer wins, which is harmless for
//! read-only reference data.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::{CoinListing, MarketData, MarketOrder, MarketSummary};
use crate::error::Result;

/// Number of coins offered as choices by the compare view.
pub const TOP_COINS_COUNT: u32 = 50;

#[derive(Debug)]
struct CacheEnvelope<T> {
    key: String,
    fetched_at_unix: i64,
    value: Arc<T>,
}

/// A single memoized value.
#[derive(Debug)]
pub struct Memo<T> {
    slot: RwLock<Option<CacheEnvelope<T>>>,
    ttl_secs: Option<i64>,
}

impl<T> Memo<T> {
    /// Memo that never expires.
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Memo whose value expires `ttl_secs` after it was fetched.
    pub fn with_ttl(ttl_secs: Option<i64>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl_secs,
        }
    }

    /// Return the memoized value for `key`, running `fetch` on a miss.
    ///
    /// A failed fetch leaves the slot untouched.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.read_fresh(key).await {
            debug!(key, "reference memo hit");
            return Ok(value);
        }

        debug!(key, "reference memo miss");
        let value = Arc::new(fetch().await?);
        *self.slot.write().await = Some(CacheEnvelope {
            key: key.to_string(),
            fetched_at_unix: chrono::Utc::now().timestamp(),
            value: Arc::clone(&value),
        });
        Ok(value)
    }

    async fn read_fresh(&self, key: &str) -> Option<Arc<T>> {
        let guard = self.slot.read().await;
        let envelope = guard.as_ref()?;
        if envelope.key != key {
            return None;
        }

        if let Some(ttl) = self.ttl_secs {
            let age_secs = chrono::Utc::now().timestamp() - envelope.fetched_at_unix;
            if age_secs < 0 || age_secs > ttl {
                return None;
            }
        }

        Some(Arc::clone(&envelope.value))
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference lookups shared by the compare and search views.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    coins_list: Memo<Vec<CoinListing>>,
    top_coins: Memo<Vec<MarketSummary>>,
}

impl ReferenceCache {
    pub fn new(ttl_secs: Option<i64>) -> Self {
        Self {
            coins_list: Memo::with_ttl(ttl_secs),
            top_coins: Memo::with_ttl(ttl_secs),
        }
    }

    /// Full coin list, fetched once.
    pub async fn coins_list(&self, client: &dyn MarketData) -> Result<Arc<Vec<CoinListing>>> {
        self.coins_list
            .get_or_fetch("coins_list", || client.get_coins_list())
            .await
    }

    /// Top coins by market cap in `currency`, fetched once per currency.
    pub async fn top_coins(
        &self,
        client: &dyn MarketData,
        currency: &str,
    ) -> Result<Arc<Vec<MarketSummary>>> {
        let cur = currency.to_lowercase();
        let key = format!("top_coins:{cur}");
        self.top_coins
            .get_or_fetch(&key, || {
                client.get_coins_markets(&cur, MarketOrder::MarketCapDesc, TOP_COINS_COUNT, 1)
            })
            .await
    }
}
