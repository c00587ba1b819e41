//! Naive linear price projection.
//!
//! Fits `price = slope * day_index + intercept` by ordinary least squares over
//! the raw samples (one day-index per sample, not per calendar day) and
//! extrapolates the same line past the window. No claim of predictive value.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::market::{MarketData, PricePoint};

/// Minimum number of samples for a defined fit.
pub const MIN_SAMPLES: usize = 2;

/// Longest forecast the projector will extrapolate.
pub const MAX_HORIZON_DAYS: usize = 365;

/// An affine model of price over day-index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Least-squares fit of `prices[i]` against `i`.
    pub fn fit(prices: &[f64]) -> Result<Self> {
        if prices.len() < MIN_SAMPLES {
            return Err(Error::InsufficientSamples {
                required: MIN_SAMPLES,
                actual: prices.len(),
            });
        }

        let n = prices.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = prices.iter().sum::<f64>() / n;

        let (num, den) = prices
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (i, &y)| {
                let dx = i as f64 - x_mean;
                (num + dx * (y - y_mean), den + dx * dx)
            });

        let slope = num / den;
        Ok(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn predict(&self, day_index: f64) -> f64 {
        self.slope * day_index + self.intercept
    }
}

/// An observed sample alongside the fitted value at its day-index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedPoint {
    pub day_index: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub actual: f64,
    pub fitted: f64,
}

/// A predicted price past the observed window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub day_index: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub price: f64,
}

/// Fitted line, forecast, and the two headline prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub model: LinearFit,
    pub fitted: Vec<FittedPoint>,
    pub forecast: Vec<ForecastPoint>,
    /// Price of the last observed sample.
    pub current_price: f64,
    /// Forecast value at the far end of the horizon.
    pub predicted_price: f64,
}

/// Fit `points` (chronological) and extrapolate `horizon` day-indices.
///
/// The forecast at day-index `N + k` is dated `k` days after the last sample,
/// so the first forecast shares the last sample's date. This offset is
/// intentional; do not shift it to `k + 1`.
pub fn project(points: &[PricePoint], horizon: usize) -> Result<Projection> {
    if !(1..=MAX_HORIZON_DAYS).contains(&horizon) {
        return Err(Error::Config(format!(
            "forecast horizon must be between 1 and {MAX_HORIZON_DAYS} days, got {horizon}"
        )));
    }

    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    let model = LinearFit::fit(&prices)?;

    let fitted: Vec<FittedPoint> = points
        .iter()
        .enumerate()
        .map(|(i, p)| FittedPoint {
            day_index: i,
            timestamp: p.timestamp,
            actual: p.price,
            fitted: model.predict(i as f64),
        })
        .collect();

    // fit() guarantees at least two samples
    let last = &points[points.len() - 1];
    let n = points.len();
    let forecast = (0..horizon)
        .map(|k| {
            let timestamp = last
                .timestamp
                .checked_add_signed(chrono::Duration::days(k as i64))
                .ok_or_else(|| {
                    Error::Config(format!(
                        "forecast date {k} days after {} is out of range",
                        last.timestamp
                    ))
                })?;
            Ok(ForecastPoint {
                day_index: n + k,
                timestamp,
                price: model.predict((n + k) as f64),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let predicted_price = forecast[forecast.len() - 1].price;
    debug!(
        slope = model.slope,
        intercept = model.intercept,
        samples = n,
        horizon,
        predicted_price,
        "projected price trend"
    );

    Ok(Projection {
        model,
        fitted,
        forecast,
        current_price: last.price,
        predicted_price,
    })
}

/// Fetch the trailing `lookback_days` of samples for `id` and project them.
pub async fn predict_coin(
    client: &dyn MarketData,
    id: &str,
    currency: &str,
    lookback_days: u32,
    horizon: usize,
) -> Result<Projection> {
    info!(
        id,
        currency,
        lookback_days,
        horizon,
        "fetching samples for projection"
    );
    let points = client.get_market_chart(id, currency, lookback_days).await?;
    project(&points, horizon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fake::{FakeMarket, point};

    const T0: i64 = 1_700_000_000_000;
    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn two_point_fit_is_exact() {
        let fit = LinearFit::fit(&[10.0, 20.0]).unwrap();
        assert!((fit.slope - 10.0).abs() < 1e-9);
        assert!((fit.intercept - 10.0).abs() < 1e-9);
    }

    #[test]
    fn fit_minimizes_squared_residuals() {
        // y = 2x + 1 with symmetric noise
        let fit = LinearFit::fit(&[1.5, 2.5, 5.5, 6.5]).unwrap();
        assert!((fit.slope - 1.8).abs() < 1e-9);
        assert!((fit.intercept - 1.3).abs() < 1e-9);
    }

    #[test]
    fn flat_series_has_zero_slope() {
        let fit = LinearFit::fit(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.predict(100.0), 5.0);
    }

    #[test]
    fn fewer_than_two_samples_is_an_error() {
        for prices in [&[][..], &[42.0][..]] {
            let err = LinearFit::fit(prices).unwrap_err();
            assert!(matches!(
                err,
                Error::InsufficientSamples { required: 2, actual } if actual == prices.len()
            ));
        }

        let err = project(&[point(T0, 1.0)], 30).unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { actual: 1, .. }));
    }

    #[test]
    fn projection_endpoint_and_headlines() {
        let points = vec![point(T0, 10.0), point(T0 + 3_600_000, 20.0)];
        let projection = project(&points, 30).unwrap();

        assert_eq!(projection.current_price, 20.0);
        assert_eq!(projection.forecast.len(), 30);
        assert_eq!(projection.forecast[0].day_index, 2);
        assert_eq!(projection.forecast[29].day_index, 31);
        assert!((projection.predicted_price - 320.0).abs() < 1e-9);

        assert_eq!(projection.fitted.len(), 2);
        assert!((projection.fitted[0].fitted - 10.0).abs() < 1e-9);
        assert!((projection.fitted[1].fitted - 20.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_dates_step_daily_from_last_sample() {
        let points = vec![
            point(T0, 1.0),
            point(T0 + 1_000, 2.0),
            point(T0 + 2_000, 3.0),
        ];
        let projection = project(&points, 3).unwrap();

        let last = points[2].timestamp;
        assert_eq!(projection.forecast[0].timestamp, last);
        assert_eq!(
            projection.forecast[2].timestamp,
            point(T0 + 2_000 + 2 * DAY_MS, 0.0).timestamp
        );
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let points = vec![point(T0, 1.0), point(T0 + 1, 2.0)];
        assert!(matches!(project(&points, 0), Err(Error::Config(_))));
    }

    #[test]
    fn oversized_horizon_is_rejected() {
        let points = vec![point(T0, 1.0), point(T0 + 1, 2.0)];
        assert!(matches!(project(&points, usize::MAX), Err(Error::Config(_))));
        assert!(project(&points, MAX_HORIZON_DAYS).is_ok());
    }

    #[test]
    fn forecast_past_the_calendar_end_is_an_error() {
        let last = chrono::DateTime::<chrono::Utc>::MAX_UTC - chrono::Duration::days(30);
        let late = last.timestamp_millis();
        let points = vec![point(late - 1, 1.0), point(late, 2.0)];

        let err = project(&points, 60).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("out of range")));
    }

    #[tokio::test]
    async fn predict_coin_surfaces_empty_chart_as_insufficient() {
        let client = FakeMarket::default().with_chart("bitcoin", Vec::new());
        let err = predict_coin(&client, "bitcoin", "usd", 30, 30)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { actual: 0, .. }));
    }

    #[tokio::test]
    async fn predict_coin_propagates_fetch_errors() {
        let client = FakeMarket::default().with_failing_chart("bitcoin");
        let err = predict_coin(&client, "bitcoin", "usd", 30, 30)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(_)));
    }
}
