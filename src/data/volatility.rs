//! Sector volatility from Yahoo Finance daily closes.
//!
//! API: `https://query1.finance.yahoo.com/v8/finance/chart/{ticker}`
//! Auth: none. Unofficial endpoint, so callers go through
//! [`super::volatility_or_fallback`] rather than relying on it.
//!
//! Volatility for a day is the sample standard deviation of the percentage
//! returns over the trailing 7-day window ending on that day. Days without
//! a full window count as zero volatility. The series covers one year of
//! history and starts at its oldest close.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::MarketDataFeed;

const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Trailing window of daily returns per volatility value.
pub const ROLLING_WINDOW: usize = 7;
/// Yahoo range requested for every fetch.
const HISTORY_RANGE: &str = "1y";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

pub struct YahooVolatilityFeed {
    http: Client,
    base_url: String,
}

impl YahooVolatilityFeed {
    pub fn new() -> Result<Self> {
        Self::with_base_url(YAHOO_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("FLOATARB/0.1.0")
            .build()
            .context("Failed to build Yahoo HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Daily closes for `ticker`, oldest first, gaps dropped.
    async fn fetch_closes(&self, ticker: &str) -> Result<Vec<f64>> {
        let url = format!(
            "{}/{}?range={HISTORY_RANGE}&interval=1d",
            self.base_url,
            urlencoding::encode(ticker),
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context(format!("Yahoo chart request failed for {ticker}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Yahoo chart API error for {ticker}: {status}");
        }

        let data: ChartResponse = resp
            .json()
            .await
            .context(format!("Failed to parse Yahoo chart response for {ticker}"))?;

        closes_from_chart(data.chart).with_context(|| format!("No price history for {ticker}"))
    }
}

#[async_trait]
impl MarketDataFeed for YahooVolatilityFeed {
    async fn fetch_volatility(&self, ticker: &str, days: usize) -> Result<Vec<f64>> {
        let closes = self.fetch_closes(ticker).await?;
        debug!(ticker, closes = closes.len(), "Yahoo closes received");

        let vol = rolling_volatility(&closes, ROLLING_WINDOW);
        if vol.len() < days {
            anyhow::bail!(
                "Only {} volatility points for {ticker}, need {days}",
                vol.len()
            );
        }
        Ok(vol[..days].to_vec())
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

fn closes_from_chart(chart: Chart) -> Option<Vec<f64>> {
    if let Some(err) = chart.error.filter(|e| !e.is_null()) {
        debug!(error = %err, "Yahoo chart returned an error payload");
        return None;
    }
    let result = chart.result?.into_iter().next()?;
    let quote = result.indicators.quote.into_iter().next()?;
    let closes: Vec<f64> = quote.close.into_iter().flatten().collect();
    if closes.is_empty() {
        None
    } else {
        Some(closes)
    }
}

/// Percentage change between consecutive closes.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Sample standard deviation (n - 1). Zero for fewer than two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

/// Rolling return volatility, one value per close.
///
/// The value for close `j` covers the `window` returns ending at `j`. The
/// first `window` closes have no full window (the first close has no
/// return at all) and are 0.0.
pub fn rolling_volatility(closes: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![0.0; closes.len().min(window)];
    if window == 0 {
        return out;
    }
    let returns = pct_returns(closes);
    out.extend(returns.windows(window).map(sample_std));
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
