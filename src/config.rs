//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at startup via `std::env::var`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::ops::RangeInclusive;

use crate::simulator::SimulationParams;
use crate::types::{OrderSide, ParamError};

/// Bounds the parameter panel accepts.
pub const HORIZON_DAYS_RANGE: RangeInclusive<usize> = 7..=90;
pub const DAILY_SPEND_RANGE: RangeInclusive<f64> = 10.0..=300.0;
pub const TRADE_THRESHOLD_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub yields: YieldsConfig,
    pub market_data: MarketDataConfig,
    pub trading: TradingConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub horizon_days: usize,
    pub daily_spend: f64,
    pub trade_threshold: f64,
    /// First simulated day. Defaults to today.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Seed for the daily spend jitter. Unset means a fresh draw every run.
    #[serde(default)]
    pub jitter_seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum YieldSourceKind {
    Synthetic,
    Fred,
}

#[derive(Debug, Deserialize, Clone)]
pub struct YieldsConfig {
    pub source: YieldSourceKind,
    pub seed: u64,
    /// Std-dev of the synthetic perturbation.
    #[serde(default)]
    pub noise: Option<f64>,
    #[serde(default)]
    pub fred_api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketDataConfig {
    pub enabled: bool,
    /// Pins the ETF whose volatility drives option income. Unset: one
    /// sector (groceries/fast food/pharmacy) is drawn per run.
    #[serde(default)]
    pub ticker: Option<String>,
    /// Seed for the sector draw. Unset means a fresh draw every run.
    #[serde(default)]
    pub sector_seed: Option<u64>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    pub enabled: bool,
    pub dry_run: bool,
    pub symbol: String,
    pub qty: Decimal,
    pub side: OrderSide,
    #[serde(default)]
    pub base_url: Option<String>,
    pub key_id_env: String,
    pub secret_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the default run parameters are inside the panel bounds.
    pub fn validate(&self) -> Result<()> {
        check_params(&self.simulation_params()).context("Invalid [simulation] section")?;
        if self.trading.qty <= Decimal::ZERO {
            anyhow::bail!("trading.qty must be positive, got {}", self.trading.qty);
        }
        if matches!(&self.market_data.ticker, Some(t) if t.trim().is_empty()) {
            anyhow::bail!("market_data.ticker must not be empty when set");
        }
        Ok(())
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            horizon_days: self.simulation.horizon_days,
            daily_spend: self.simulation.daily_spend,
            trade_threshold: self.simulation.trade_threshold,
        }
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

/// Check run parameters against the panel bounds.
pub fn check_params(params: &SimulationParams) -> Result<(), ParamError> {
    if !HORIZON_DAYS_RANGE.contains(&params.horizon_days) {
        return Err(ParamError::Horizon {
            value: params.horizon_days,
            min: *HORIZON_DAYS_RANGE.start(),
            max: *HORIZON_DAYS_RANGE.end(),
        });
    }
    if !DAILY_SPEND_RANGE.contains(&params.daily_spend) {
        return Err(ParamError::DailySpend {
            value: params.daily_spend,
            min: *DAILY_SPEND_RANGE.start(),
            max: *DAILY_SPEND_RANGE.end(),
        });
    }
    if !TRADE_THRESHOLD_RANGE.contains(&params.trade_threshold) {
        return Err(ParamError::TradeThreshold {
            value: params.trade_threshold,
            min: *TRADE_THRESHOLD_RANGE.start(),
            max: *TRADE_THRESHOLD_RANGE.end(),
        });
    }
    Ok(())
}
