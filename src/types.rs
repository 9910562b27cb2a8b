//! Shared types for the FLOATARB simulator.
//!
//! These types form the data model used across all modules: the synthetic
//! float positions, the per-day simulation output, the market data series
//! fed into a run, and the order types handed to the trade sink.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of days a float is held before its obligation settles.
pub const MATURITY_DAYS: u64 = 42;

/// Round to two decimal places (cents / basis-point display).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Float positions
// ---------------------------------------------------------------------------

/// One synthetic float: a day's spend held until its payout settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatPosition {
    pub start: NaiveDate,
    /// Exclusive end of the holding window (`start + 42 days`).
    pub end: NaiveDate,
    pub amount: f64,
}

impl FloatPosition {
    pub fn open(start: NaiveDate, amount: f64) -> Self {
        // NaiveDate only overflows near year 262143.
        let end = start
            .checked_add_days(Days::new(MATURITY_DAYS))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end, amount }
    }

    /// Whether the float is still held on `day`.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }
}

// ---------------------------------------------------------------------------
// Simulation output
// ---------------------------------------------------------------------------

/// Full-precision snapshot of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub new_float: f64,
    pub total_float: f64,
    pub daily_profit: f64,
    pub cumulative_profit: f64,
    pub option_income: f64,
    pub vol_multiplier: f64,
    /// Fractional annual rates as supplied by the yield feed.
    pub yield_1m: f64,
    pub yield_3m: f64,
    pub yield_1y: f64,
}

/// Display form of a [`DailyRecord`]: money rounded to cents, yields as
/// percentages rounded to two places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryRow {
    pub date: NaiveDate,
    pub new_float: f64,
    pub total_float: f64,
    pub daily_profit: f64,
    pub cumulative_profit: f64,
    pub option_income: f64,
    pub vol_multiplier: f64,
    pub yield_1m_pct: f64,
    pub yield_3m_pct: f64,
    pub yield_1y_pct: f64,
}

impl From<&DailyRecord> for DailySummaryRow {
    fn from(r: &DailyRecord) -> Self {
        Self {
            date: r.date,
            new_float: round2(r.new_float),
            total_float: round2(r.total_float),
            daily_profit: round2(r.daily_profit),
            cumulative_profit: round2(r.cumulative_profit),
            option_income: round2(r.option_income),
            vol_multiplier: round2(r.vol_multiplier),
            yield_1m_pct: round2(r.yield_1m * 100.0),
            yield_3m_pct: round2(r.yield_3m * 100.0),
            yield_1y_pct: round2(r.yield_1y * 100.0),
        }
    }
}

impl fmt::Display for DailySummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | new ${:>8.2} | float ${:>10.2} | day ${:>8.2} | cum ${:>10.2} | opt ${:>7.2} | vol x{:.2} | 1M {:.2}% 3M {:.2}% 1Y {:.2}%",
            self.date,
            self.new_float,
            self.total_float,
            self.daily_profit,
            self.cumulative_profit,
            self.option_income,
            self.vol_multiplier,
            self.yield_1m_pct,
            self.yield_3m_pct,
            self.yield_1y_pct,
        )
    }
}

/// Signal that a day's option income crossed the trade threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub day_index: usize,
    pub option_income: f64,
}

// ---------------------------------------------------------------------------
// Market data series
// ---------------------------------------------------------------------------

/// Three parallel yield curves as fractional annual rates, indexed by day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldSeries {
    pub one_month: Vec<f64>,
    pub three_month: Vec<f64>,
    pub one_year: Vec<f64>,
}

impl YieldSeries {
    /// Same rate on every curve for every day.
    pub fn flat(rate: f64, days: usize) -> Self {
        Self {
            one_month: vec![rate; days],
            three_month: vec![rate; days],
            one_year: vec![rate; days],
        }
    }

    /// Usable length: the shortest of the three curves.
    pub fn len(&self) -> usize {
        self.one_month
            .len()
            .min(self.three_month.len())
            .min(self.one_year.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest of the three curves on day `i`.
    pub fn best(&self, i: usize) -> f64 {
        self.one_month[i].max(self.three_month[i]).max(self.one_year[i])
    }
}

/// Where a volatility series came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VolatilitySource {
    Live { ticker: String },
    Fallback,
}

impl fmt::Display for VolatilitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolatilitySource::Live { ticker } => write!(f, "live ({ticker})"),
            VolatilitySource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Daily return-volatility values (fractional std-dev), indexed by day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySeries {
    pub values: Vec<f64>,
    pub source: VolatilitySource,
}

impl VolatilitySeries {
    pub fn live(ticker: &str, values: Vec<f64>) -> Self {
        Self {
            values,
            source: VolatilitySource::Live {
                ticker: ticker.to_string(),
            },
        }
    }

    pub fn constant(value: f64, days: usize) -> Self {
        Self {
            values: vec![value; days],
            source: VolatilitySource::Fallback,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        self.source == VolatilitySource::Fallback
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good till cancelled.
    Gtc,
}

/// An order to hand to a [`crate::broker::TradeSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub symbol: String,
    pub qty: Decimal,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
}

impl TradeOrder {
    /// Market order, good till cancelled.
    pub fn market_gtc(symbol: &str, qty: Decimal, side: OrderSide) -> Self {
        Self {
            symbol: symbol.to_string(),
            qty,
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Gtc,
        }
    }
}

impl TradeOrder {
    /// Trade-log wording, e.g. `Buy 1 shares of SPY`.
    pub fn describe(&self) -> String {
        let side = match self.side {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        };
        format!("{side} {} shares of {}", self.qty.normalize(), self.symbol)
    }
}

impl fmt::Display for TradeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.side, self.qty, self.symbol)
    }
}

/// Broker acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub status: String,
    pub symbol: String,
    pub qty: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// One line of the chronological trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub date: NaiveDate,
    pub success: bool,
    pub message: String,
}

impl fmt::Display for TradeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.date, self.message)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Precondition violations of a simulation run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("{feed} feed too short: need {required} days, got {available}")]
    FeedTooShort {
        feed: &'static str,
        required: usize,
        available: usize,
    },

    #[error("daily spend must be a positive amount, got {0}")]
    InvalidSpend(f64),

    #[error("trade threshold must be non-negative, got {0}")]
    InvalidThreshold(f64),
}

/// Run parameters outside the ranges the parameter panel allows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("horizon_days must be within {min}..={max}, got {value}")]
    Horizon { value: usize, min: usize, max: usize },

    #[error("daily_spend must be within {min}..={max}, got {value}")]
    DailySpend { value: f64, min: f64, max: f64 },

    #[error("trade_threshold must be within {min}..={max}, got {value}")]
    TradeThreshold { value: f64, min: f64, max: f64 },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
