//! Market data feeds.
//!
//! Defines the `YieldFeed` and `MarketDataFeed` traits consumed by the
//! session engine, plus the explicit volatility fallback path. The
//! simulator itself never touches these: it only sees the fetched series.

pub mod sector;
pub mod volatility;
pub mod yields;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::types::{VolatilitySeries, YieldSeries};

/// Per-day volatility substituted when the market data fetch fails.
pub const FALLBACK_VOLATILITY: f64 = 0.01;

/// Source of 1-month / 3-month / 1-year yield curves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait YieldFeed: Send + Sync {
    /// Fetch at least `days` daily values per curve, as fractional annual rates.
    async fn fetch_yields(&self, days: usize) -> Result<YieldSeries>;

    /// Feed name for logging.
    fn name(&self) -> &str;
}

/// Source of daily return-volatility for a ticker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// Fetch at least `days` daily return-std values for `ticker`.
    async fn fetch_volatility(&self, ticker: &str, days: usize) -> Result<Vec<f64>>;

    /// Feed name for logging.
    fn name(&self) -> &str;
}

/// Fetch volatility, substituting a constant low-volatility series on failure.
///
/// A live series shorter than `days` counts as a failure. The returned
/// series is tagged so callers can tell live data from the fallback.
pub async fn volatility_or_fallback(
    feed: &dyn MarketDataFeed,
    ticker: &str,
    days: usize,
) -> VolatilitySeries {
    match feed.fetch_volatility(ticker, days).await {
        Ok(values) if values.len() >= days => {
            info!(feed = feed.name(), ticker, days, "Using live volatility");
            VolatilitySeries::live(ticker, values)
        }
        Ok(values) => {
            warn!(
                feed = feed.name(),
                ticker,
                requested = days,
                received = values.len(),
                fallback = FALLBACK_VOLATILITY,
                "Volatility series too short, using fallback"
            );
            VolatilitySeries::constant(FALLBACK_VOLATILITY, days)
        }
        Err(e) => {
            warn!(
                feed = feed.name(),
                ticker,
                error = %e,
                fallback = FALLBACK_VOLATILITY,
                "Volatility fetch failed, using fallback"
            );
            VolatilitySeries::constant(FALLBACK_VOLATILITY, days)
        }
    }
}
