//! Session report: everything one run produced, plus summary totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::sector::Sector;
use crate::simulator::{SimulationOutput, SimulationParams};
use crate::types::{
    round2, DailyRecord, DailySummaryRow, TradeEvent, TradeLogEntry, VolatilitySource,
};

/// Aggregate figures for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub days: usize,
    pub final_cumulative_profit: f64,
    pub total_option_income: f64,
    pub total_yield_income: f64,
    pub peak_total_float: f64,
    pub average_daily_profit: f64,
    pub trade_signals: usize,
    pub trades_submitted: usize,
    pub trades_failed: usize,
}

impl SessionSummary {
    pub fn compute(records: &[DailyRecord], trade_log: &[TradeLogEntry]) -> Self {
        if records.is_empty() {
            return Self {
                trade_signals: trade_log.len(),
                ..Self::default()
            };
        }

        let total_option_income: f64 = records.iter().map(|r| r.option_income).sum();
        let total_profit: f64 = records.iter().map(|r| r.daily_profit).sum();
        let submitted = trade_log.iter().filter(|t| t.success).count();

        Self {
            days: records.len(),
            final_cumulative_profit: records.last().map(|r| r.cumulative_profit).unwrap_or(0.0),
            total_option_income,
            total_yield_income: total_profit - total_option_income,
            peak_total_float: records.iter().map(|r| r.total_float).fold(0.0, f64::max),
            average_daily_profit: total_profit / records.len() as f64,
            trade_signals: trade_log.len(),
            trades_submitted: submitted,
            trades_failed: trade_log.len() - submitted,
        }
    }
}

/// One (date, value) point of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: String,
    pub value: f64,
}

/// Three-line yield chart data, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldCurvePoint {
    pub date: String,
    pub one_month_pct: f64,
    pub three_month_pct: f64,
    pub one_year_pct: f64,
}

/// Complete output of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub params: SimulationParams,
    pub started_at: DateTime<Utc>,
    pub yield_feed: String,
    /// Sector drawn for the run; `None` when the ticker was pinned.
    pub sector: Option<Sector>,
    /// ETF whose volatility was requested.
    pub ticker: String,
    pub volatility_source: VolatilitySource,
    pub records: Vec<DailyRecord>,
    pub trade_events: Vec<TradeEvent>,
    pub trade_log: Vec<TradeLogEntry>,
    pub summary: SessionSummary,
}

impl SessionReport {
    pub fn new(
        params: SimulationParams,
        yield_feed: &str,
        sector: Option<Sector>,
        ticker: String,
        volatility_source: VolatilitySource,
        output: SimulationOutput,
        trade_log: Vec<TradeLogEntry>,
    ) -> Self {
        let summary = SessionSummary::compute(&output.records, &trade_log);
        Self {
            params,
            started_at: Utc::now(),
            yield_feed: yield_feed.to_string(),
            sector,
            ticker,
            volatility_source,
            records: output.records,
            trade_events: output.trade_events,
            trade_log,
            summary,
        }
    }

    pub fn used_fallback_volatility(&self) -> bool {
        self.volatility_source == VolatilitySource::Fallback
    }

    /// Daily table in display form.
    pub fn summary_rows(&self) -> Vec<DailySummaryRow> {
        self.records.iter().map(DailySummaryRow::from).collect()
    }

    pub fn cumulative_profit_series(&self) -> Vec<SeriesPoint> {
        self.series(|r| r.cumulative_profit)
    }

    pub fn option_income_series(&self) -> Vec<SeriesPoint> {
        self.series(|r| r.option_income)
    }

    pub fn yield_curve_series(&self) -> Vec<YieldCurvePoint> {
        self.records
            .iter()
            .map(|r| YieldCurvePoint {
                date: r.date.to_string(),
                one_month_pct: round2(r.yield_1m * 100.0),
                three_month_pct: round2(r.yield_3m * 100.0),
                one_year_pct: round2(r.yield_1y * 100.0),
            })
            .collect()
    }

    fn series(&self, value: impl Fn(&DailyRecord) -> f64) -> Vec<SeriesPoint> {
        self.records
            .iter()
            .map(|r| SeriesPoint {
                date: r.date.to_string(),
                value: round2(value(r)),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
