//! Daily trend aggregation across one or more coins.
//!
//! Raw market-chart samples are bucketed by the UTC calendar date of their
//! millisecond timestamp (no zone adjustment), averaged per bucket, and the
//! per-coin series are outer-joined on date for joint charting.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::FetchFailure;
use crate::market::{MarketData, PricePoint};

/// A coin to chart: API id plus the label used for its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinRef {
    pub id: String,
    pub name: String,
}

impl CoinRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Mean price for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub price: f64,
}

/// One coin's prices, one entry per date present in the raw samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTrendSeries {
    pub id: String,
    pub name: String,
    pub days: Vec<DailyPrice>,
}

impl DailyTrendSeries {
    /// Bucket raw samples by date. Returns `None` when there are no samples.
    pub fn from_points(coin: &CoinRef, points: &[PricePoint]) -> Option<Self> {
        let days = daily_means(points);
        if days.is_empty() {
            return None;
        }

        Some(Self {
            id: coin.id.clone(),
            name: coin.name.clone(),
            days,
        })
    }
}

/// Arithmetic mean of the samples sharing each UTC date, ascending by date.
pub fn daily_means(points: &[PricePoint]) -> Vec<DailyPrice> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for point in points {
        let bucket = buckets
            .entry(point.timestamp.date_naive())
            .or_insert((0.0, 0));
        bucket.0 += point.price;
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (sum, count))| DailyPrice {
            date,
            price: sum / count as f64,
        })
        .collect()
}

/// One date of a [`TrendTable`]; `values` lines up with the table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Date-indexed outer join of several daily series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendTable {
    pub columns: Vec<String>,
    pub rows: Vec<TrendRow>,
}

impl TrendTable {
    /// Outer-join `series` on date, sorted ascending. Missing cells are `None`.
    pub fn join(series: &[DailyTrendSeries]) -> Self {
        let dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|s| s.days.iter().map(|d| d.date))
            .collect();

        let lookups: Vec<BTreeMap<NaiveDate, f64>> = series
            .iter()
            .map(|s| s.days.iter().map(|d| (d.date, d.price)).collect())
            .collect();

        let rows = dates
            .into_iter()
            .map(|date| TrendRow {
                date,
                values: lookups.iter().map(|l| l.get(&date).copied()).collect(),
            })
            .collect();

        Self {
            columns: series.iter().map(|s| s.name.clone()).collect(),
            rows,
        }
    }

    /// True when no coin produced any data.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `(row index, value)` pairs present for column `idx`.
    pub fn column_points(&self, idx: usize) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                row.values
                    .get(idx)
                    .copied()
                    .flatten()
                    .map(|v| (i as f64, v))
            })
            .collect()
    }
}

/// Output of [`collect_daily_trends`].
///
/// Serializes with an explicit `no_data` flag alongside the table.
#[derive(Debug, Clone, Default)]
pub struct TrendReport {
    pub table: TrendTable,
    pub failures: Vec<FetchFailure>,
}

impl TrendReport {
    /// Nothing to chart: every coin failed or returned no samples.
    pub fn no_data(&self) -> bool {
        self.table.is_empty()
    }
}

impl Serialize for TrendReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TrendReport", 3)?;
        state.serialize_field("table", &self.table)?;
        state.serialize_field("failures", &self.failures)?;
        state.serialize_field("no_data", &self.no_data())?;
        state.end()
    }
}

/// Fetch and bucket the trailing `days` of prices for each coin.
///
/// Fetches run one after another. A failed fetch is recorded in
/// [`TrendReport::failures`] and the remaining coins are still processed.
/// Coins that return no samples are left out of the table.
pub async fn collect_daily_trends(
    client: &dyn MarketData,
    coins: &[CoinRef],
    currency: &str,
    days: u32,
) -> TrendReport {
    let mut series = Vec::with_capacity(coins.len());
    let mut failures = Vec::new();

    for coin in coins {
        match client.get_market_chart(&coin.id, currency, days).await {
            Ok(points) => match DailyTrendSeries::from_points(coin, &points) {
                Some(s) => {
                    debug!(
                        id = %coin.id,
                        samples = points.len(),
                        days = s.days.len(),
                        "bucketed trend"
                    );
                    series.push(s);
                }
                None => info!(id = %coin.id, "no trend samples returned"),
            },
            Err(err) => {
                warn!(id = %coin.id, error = %err, "trend fetch failed");
                failures.push(FetchFailure::new(&coin.id, "market_chart", &err));
            }
        }
    }

    TrendReport {
        table: TrendTable::join(&series),
        failures,
    }
}
