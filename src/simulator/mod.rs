//! Float accrual simulator.
//!
//! Opens one synthetic float per day, accrues bond/cash yield on every
//! float still inside its holding window, adds a volatility-scaled option
//! income term and keeps a running profit total. Pure computation: all
//! market data arrives pre-fetched and randomness comes from an injected
//! [`AmountJitter`].

pub mod jitter;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{
    round2, DailyRecord, FloatPosition, SimulationError, TradeEvent, VolatilitySeries, YieldSeries,
};
use jitter::AmountJitter;

/// Share of each float parked in bonds; the remainder sits in cash.
pub const BOND_ALLOCATION: f64 = 0.75;
/// Annualized yield on the cash portion.
pub const CASH_YIELD: f64 = 0.0375;
/// Scales fractional daily volatility into the option-income multiplier.
pub const VOL_SCALE: f64 = 100.0;
/// Option income earned per this much active float at multiplier 1.
pub const OPTION_INCOME_DIVISOR: f64 = 1000.0;

const DAYS_PER_YEAR: f64 = 365.0;

// ---------------------------------------------------------------------------
// Parameters and output
// ---------------------------------------------------------------------------

/// Inputs of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub horizon_days: usize,
    pub daily_spend: f64,
    pub trade_threshold: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            daily_spend: 85.0,
            trade_threshold: 3.5,
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub records: Vec<DailyRecord>,
    pub trade_events: Vec<TradeEvent>,
    /// Every float opened during the run, in creation order.
    pub floats: Vec<FloatPosition>,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct FloatSimulator {
    start_date: NaiveDate,
    jitter: Box<dyn AmountJitter>,
}

impl FloatSimulator {
    pub fn new(start_date: NaiveDate, jitter: Box<dyn AmountJitter>) -> Self {
        Self { start_date, jitter }
    }

    /// Run the simulation over `params.horizon_days` days.
    ///
    /// Both series must cover the horizon; a short series is rejected
    /// before any day is simulated.
    pub fn run(
        &mut self,
        params: &SimulationParams,
        yields: &YieldSeries,
        volatility: &VolatilitySeries,
    ) -> Result<SimulationOutput, SimulationError> {
        Self::check_inputs(params, yields, volatility)?;

        let horizon = params.horizon_days;
        let mut floats: Vec<FloatPosition> = Vec::with_capacity(horizon);
        let mut records = Vec::with_capacity(horizon);
        let mut trade_events = Vec::new();
        let mut cumulative_profit = 0.0_f64;

        for i in 0..horizon {
            let today = self.day(i);

            let amount = round2(params.daily_spend * self.jitter.next_factor());
            floats.push(FloatPosition::open(today, amount));

            let bond_yield = yields.best(i);
            let (total_float, accrual) = floats
                .iter()
                .filter(|f| f.is_active_on(today))
                .fold((0.0_f64, 0.0_f64), |(total, accrual), f| {
                    (total + f.amount, accrual + daily_accrual(f.amount, bond_yield))
                });

            let vol_multiplier = 1.0 + volatility.values[i] * VOL_SCALE;
            let option_income = (total_float / OPTION_INCOME_DIVISOR) * vol_multiplier;

            let daily_profit = accrual + option_income;
            cumulative_profit += daily_profit;

            if option_income >= params.trade_threshold {
                debug!(
                    date = %today,
                    option_income = format!("{option_income:.4}"),
                    threshold = params.trade_threshold,
                    "Trade signal"
                );
                trade_events.push(TradeEvent {
                    date: today,
                    day_index: i,
                    option_income,
                });
            }

            records.push(DailyRecord {
                date: today,
                new_float: amount,
                total_float,
                daily_profit,
                cumulative_profit,
                option_income,
                vol_multiplier,
                yield_1m: yields.one_month[i],
                yield_3m: yields.three_month[i],
                yield_1y: yields.one_year[i],
            });
        }

        debug!(
            days = horizon,
            signals = trade_events.len(),
            cumulative_profit = format!("{cumulative_profit:.2}"),
            "Simulation complete"
        );

        Ok(SimulationOutput {
            records,
            trade_events,
            floats,
        })
    }

    fn day(&self, offset: usize) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(offset as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    fn check_inputs(
        params: &SimulationParams,
        yields: &YieldSeries,
        volatility: &VolatilitySeries,
    ) -> Result<(), SimulationError> {
        if !params.daily_spend.is_finite() || params.daily_spend <= 0.0 {
            return Err(SimulationError::InvalidSpend(params.daily_spend));
        }
        if !params.trade_threshold.is_finite() || params.trade_threshold < 0.0 {
            return Err(SimulationError::InvalidThreshold(params.trade_threshold));
        }
        if yields.len() < params.horizon_days {
            return Err(SimulationError::FeedTooShort {
                feed: "yield",
                required: params.horizon_days,
                available: yields.len(),
            });
        }
        if volatility.len() < params.horizon_days {
            return Err(SimulationError::FeedTooShort {
                feed: "volatility",
                required: params.horizon_days,
                available: volatility.len(),
            });
        }
        Ok(())
    }
}

/// One day of interest on a float split between bonds and cash.
pub fn daily_accrual(amount: f64, bond_yield: f64) -> f64 {
    let bond_part = amount * BOND_ALLOCATION;
    let cash_part = amount - bond_part;
    bond_part * bond_yield / DAYS_PER_YEAR + cash_part * CASH_YIELD / DAYS_PER_YEAR
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use jitter::{FixedJitter, UniformJitter};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn fixed_sim() -> FloatSimulator {
        FloatSimulator::new(start(), Box::new(FixedJitter(1.0)))
    }

    fn params(horizon_days: usize, daily_spend: f64, trade_threshold: f64) -> SimulationParams {
        SimulationParams { horizon_days, daily_spend, trade_threshold }
    }

    #[test]
    fn test_default_params() {
        let p = SimulationParams::default();
        assert_eq!(p.horizon_days, 30);
        assert_eq!(p.daily_spend, 85.0);
        assert_eq!(p.trade_threshold, 3.5);
    }

    #[test]
    fn test_single_day_profit() {
        let mut sim = fixed_sim();
        let out = sim
            .run(&params(1, 100.0, 0.0), &YieldSeries::flat(0.05, 1), &VolatilitySeries::constant(0.0, 1))
            .unwrap();

        let expected = 100.0 * 0.75 * 0.05 / 365.0 + 100.0 * 0.25 * 0.0375 / 365.0 + 0.1;
        assert_eq!(out.records.len(), 1);
        assert!((out.records[0].daily_profit - expected).abs() < 1e-6);
        assert!((out.records[0].vol_multiplier - 1.0).abs() < 1e-12);
        assert!((out.records[0].option_income - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_cumulative_is_running_sum() {
        let mut sim = FloatSimulator::new(start(), Box::new(UniformJitter::seeded(3)));
        let out = sim
            .run(&params(90, 85.0, 1.0), &YieldSeries::flat(0.05, 90), &VolatilitySeries::constant(0.02, 90))
            .unwrap();

        let mut running = 0.0;
        for rec in &out.records {
            running += rec.daily_profit;
            assert!((rec.cumulative_profit - running).abs() < 1e-9);
        }
    }

    #[test]
    fn test_float_leaves_active_set_after_42_days() {
        let mut sim = fixed_sim();
        let out = sim
            .run(&params(60, 100.0, 0.0), &YieldSeries::flat(0.05, 60), &VolatilitySeries::constant(0.0, 60))
            .unwrap();

        // Days 0..42 accumulate one float per day; afterwards the window is full.
        assert!((out.records[0].total_float - 100.0).abs() < 1e-9);
        assert!((out.records[41].total_float - 4200.0).abs() < 1e-9);
        assert!((out.records[42].total_float - 4200.0).abs() < 1e-9);
        assert!((out.records[59].total_float - 4200.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_float_matches_active_positions() {
        let mut sim = FloatSimulator::new(start(), Box::new(UniformJitter::seeded(11)));
        let out = sim
            .run(&params(75, 120.0, 0.0), &YieldSeries::flat(0.05, 75), &VolatilitySeries::constant(0.01, 75))
            .unwrap();

        for rec in &out.records {
            let expected: f64 = out
                .floats
                .iter()
                .filter(|f| f.start <= rec.date && rec.date < f.end)
                .map(|f| f.amount)
                .sum();
            assert!((rec.total_float - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_amounts_rounded_and_jittered() {
        let mut sim = FloatSimulator::new(start(), Box::new(UniformJitter::seeded(5)));
        let out = sim
            .run(&params(30, 85.0, 0.0), &YieldSeries::flat(0.05, 30), &VolatilitySeries::constant(0.0, 30))
            .unwrap();

        for f in &out.floats {
            assert!(f.amount >= round2(85.0 * 0.85) && f.amount <= round2(85.0 * 1.15));
            assert!(((f.amount * 100.0).round() - f.amount * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_best_of_three_curves_used() {
        let ys = YieldSeries {
            one_month: vec![0.01],
            three_month: vec![0.08],
            one_year: vec![0.02],
        };
        let mut sim = fixed_sim();
        let out = sim
            .run(&params(1, 100.0, 0.0), &ys, &VolatilitySeries::constant(0.0, 1))
            .unwrap();

        let expected = daily_accrual(100.0, 0.08) + 0.1;
        assert!((out.records[0].daily_profit - expected).abs() < 1e-12);
        assert!((out.records[0].yield_3m - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_trade_event_iff_threshold_reached() {
        let mut sim = fixed_sim();
        let threshold = 1.0;
        let out = sim
            .run(&params(20, 100.0, threshold), &YieldSeries::flat(0.05, 20), &VolatilitySeries::constant(0.0, 20))
            .unwrap();

        let flagged: Vec<usize> = out.trade_events.iter().map(|e| e.day_index).collect();
        let expected: Vec<usize> = out
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.option_income >= threshold)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, expected);
        // Float reaches 1000 on day 9 (10 floats of 100).
        assert_eq!(flagged.first(), Some(&9));
        assert_eq!(out.trade_events[0].date, out.records[9].date);
    }

    #[test]
    fn test_option_income_non_negative() {
        let mut sim = FloatSimulator::new(start(), Box::new(UniformJitter::seeded(9)));
        let out = sim
            .run(&params(30, 10.0, 0.0), &YieldSeries::flat(0.05, 30), &VolatilitySeries::constant(0.03, 30))
            .unwrap();
        for rec in &out.records {
            assert!(rec.vol_multiplier >= 1.0);
            assert!(rec.option_income >= 0.0);
        }
    }

    #[test]
    fn test_volatility_multiplier() {
        let mut sim = fixed_sim();
        let out = sim
            .run(&params(1, 100.0, 0.0), &YieldSeries::flat(0.05, 1), &VolatilitySeries::constant(0.01, 1))
            .unwrap();
        assert!((out.records[0].vol_multiplier - 2.0).abs() < 1e-12);
        assert!((out.records[0].option_income - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_dates_advance_daily() {
        let mut sim = fixed_sim();
        let out = sim
            .run(&params(3, 50.0, 0.0), &YieldSeries::flat(0.05, 3), &VolatilitySeries::constant(0.0, 3))
            .unwrap();
        let dates: Vec<String> = out.records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);
    }

    #[test]
    fn test_short_yield_feed_fails_fast() {
        let mut sim = fixed_sim();
        let err = sim
            .run(&params(10, 85.0, 0.0), &YieldSeries::flat(0.05, 9), &VolatilitySeries::constant(0.01, 10))
            .unwrap_err();
        assert_eq!(err, SimulationError::FeedTooShort { feed: "yield", required: 10, available: 9 });
    }

    #[test]
    fn test_short_volatility_feed_fails_fast() {
        let mut sim = fixed_sim();
        let err = sim
            .run(&params(10, 85.0, 0.0), &YieldSeries::flat(0.05, 10), &VolatilitySeries::constant(0.01, 3))
            .unwrap_err();
        assert!(matches!(err, SimulationError::FeedTooShort { feed: "volatility", .. }));
    }

    #[test]
    fn test_rejects_bad_spend_and_threshold() {
        let mut sim = fixed_sim();
        let ys = YieldSeries::flat(0.05, 5);
        let vs = VolatilitySeries::constant(0.01, 5);
        assert!(matches!(sim.run(&params(5, 0.0, 0.0), &ys, &vs), Err(SimulationError::InvalidSpend(_))));
        assert!(matches!(sim.run(&params(5, f64::NAN, 0.0), &ys, &vs), Err(SimulationError::InvalidSpend(_))));
        assert!(matches!(sim.run(&params(5, 85.0, -1.0), &ys, &vs), Err(SimulationError::InvalidThreshold(_))));
    }

    #[test]
    fn test_longer_feeds_are_accepted() {
        let mut sim = fixed_sim();
        let out = sim
            .run(&params(7, 85.0, 0.0), &YieldSeries::flat(0.05, 30), &VolatilitySeries::constant(0.01, 30))
            .unwrap();
        assert_eq!(out.records.len(), 7);
    }

    #[test]
    fn test_deterministic_with_fixed_jitter() {
        let ys = YieldSeries::flat(0.052, 45);
        let vs = VolatilitySeries::constant(0.015, 45);
        let a = fixed_sim().run(&params(45, 85.0, 2.0), &ys, &vs).unwrap();
        let b = fixed_sim().run(&params(45, 85.0, 2.0), &ys, &vs).unwrap();
        assert_eq!(a, b);
    }
}
