//! Yield curve feeds.
//!
//! `SyntheticYieldFeed` perturbs fixed baselines with seeded Gaussian noise.
//! `FredYieldFeed` pulls constant-maturity Treasury yields from the FRED API
//! (Federal Reserve Economic Data).
//!
//! API: `https://api.stlouisfed.org/fred/series/observations`
//! Auth: API key via `api_key` query param. Free registration.
//! Series: DGS1MO (1-month), DGS3MO (3-month), DGS1 (1-year), in percent.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{debug, info};

use super::YieldFeed;
use crate::types::YieldSeries;

// ---------------------------------------------------------------------------
// Synthetic feed
// ---------------------------------------------------------------------------

pub const BASE_YIELD_1M: f64 = 0.05;
pub const BASE_YIELD_3M: f64 = 0.055;
pub const BASE_YIELD_1Y: f64 = 0.057;
/// Std-dev of the daily perturbation around each baseline.
pub const DEFAULT_YIELD_NOISE: f64 = 0.002;

/// Baseline rates plus Gaussian noise. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct SyntheticYieldFeed {
    seed: u64,
    noise: f64,
}

impl SyntheticYieldFeed {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            noise: DEFAULT_YIELD_NOISE,
        }
    }

    pub fn with_noise(seed: u64, noise: f64) -> Self {
        Self { seed, noise }
    }

    /// Generate `days` values per curve. Same seed, same series.
    pub fn generate(&self, days: usize) -> YieldSeries {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let curve = |base: f64, rng: &mut StdRng| -> Vec<f64> {
            (0..days)
                .map(|_| base + self.noise * standard_normal(rng))
                .collect()
        };
        let one_month = curve(BASE_YIELD_1M, &mut rng);
        let three_month = curve(BASE_YIELD_3M, &mut rng);
        let one_year = curve(BASE_YIELD_1Y, &mut rng);
        YieldSeries {
            one_month,
            three_month,
            one_year,
        }
    }
}

#[async_trait]
impl YieldFeed for SyntheticYieldFeed {
    async fn fetch_yields(&self, days: usize) -> Result<YieldSeries> {
        debug!(seed = self.seed, days, "Generating synthetic yields");
        Ok(self.generate(days))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Box-Muller transform to generate N(0,1) samples.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.random_range(0.0001f64..1.0);
    let u2: f64 = rng.random_range(0.0f64..std::f64::consts::TAU);
    (-2.0 * u1.ln()).sqrt() * u2.cos()
}

// ---------------------------------------------------------------------------
// FRED feed
// ---------------------------------------------------------------------------

const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const SERIES_1M: &str = "DGS1MO";
const SERIES_3M: &str = "DGS3MO";
const SERIES_1Y: &str = "DGS1";

#[derive(Debug, Deserialize)]
struct FredResponse {
    #[serde(default)]
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

/// Live Treasury yields from FRED.
pub struct FredYieldFeed {
    http: Client,
    api_key: Secret<String>,
    base_url: String,
}

impl FredYieldFeed {
    pub fn new(api_key: Secret<String>) -> Result<Self> {
        Self::with_base_url(api_key, FRED_BASE_URL)
    }

    pub fn with_base_url(api_key: Secret<String>, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("FLOATARB/0.1.0")
            .build()
            .context("Failed to build FRED HTTP client")?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the most recent observations for a series, oldest first.
    async fn fetch_series(&self, series_id: &str, limit: usize) -> Result<Vec<FredObservation>> {
        let url = format!(
            "{}?series_id={series_id}&api_key={}&file_type=json&sort_order=desc&limit={limit}",
            self.base_url,
            urlencoding::encode(self.api_key.expose_secret()),
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context(format!("FRED request failed for {series_id}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("FRED API error for {series_id}: {status}");
        }

        let data: FredResponse = resp
            .json()
            .await
            .context(format!("Failed to parse FRED response for {series_id}"))?;

        let mut observations = data.observations;
        observations.reverse();
        Ok(observations)
    }

    /// Fetch one curve as fractional rates, `days` long.
    async fn fetch_curve(&self, series_id: &str, days: usize) -> Result<Vec<f64>> {
        // Weekends and holidays publish "." so ask for extra history.
        let observations = self.fetch_series(series_id, days * 2 + 10).await?;
        debug!(
            series = series_id,
            count = observations.len(),
            latest = observations.last().map(|o| o.date.as_str()).unwrap_or("-"),
            "FRED observations received"
        );
        let rates = observations_to_rates(&observations);
        fill_to_length(&rates, days)
            .with_context(|| format!("FRED series {series_id} has no usable observations"))
    }
}

#[async_trait]
impl YieldFeed for FredYieldFeed {
    async fn fetch_yields(&self, days: usize) -> Result<YieldSeries> {
        let one_month = self.fetch_curve(SERIES_1M, days).await?;
        let three_month = self.fetch_curve(SERIES_3M, days).await?;
        let one_year = self.fetch_curve(SERIES_1Y, days).await?;
        info!(days, "FRED yield curves loaded");
        Ok(YieldSeries {
            one_month,
            three_month,
            one_year,
        })
    }

    fn name(&self) -> &str {
        "fred"
    }
}

/// Parse percent observations to fractional rates, skipping missing (".") values.
fn observations_to_rates(observations: &[FredObservation]) -> Vec<f64> {
    observations
        .iter()
        .filter_map(|o| o.value.parse::<f64>().ok())
        .map(|pct| pct / 100.0)
        .collect()
}

/// Take the last `days` values, forward-filling with the latest value when
/// there is less history than requested. `None` if `values` is empty.
fn fill_to_length(values: &[f64], days: usize) -> Option<Vec<f64>> {
    let last = *values.last()?;
    let mut out: Vec<f64> = values[values.len().saturating_sub(days)..].to_vec();
    out.resize(days, last);
    Some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
