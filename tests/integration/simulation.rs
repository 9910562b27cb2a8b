//! End-to-end session runs.
//!
//! Drives the full fetch → simulate → execute pipeline with the synthetic
//! yield feed and in-memory collaborators, checking the run-level
//! properties of the float simulation.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use floatarb::data::sector::SectorDraw;
use floatarb::data::yields::SyntheticYieldFeed;
use floatarb::data::FALLBACK_VOLATILITY;
use floatarb::engine::executor::{Executor, OrderTemplate};
use floatarb::engine::session::SessionEngine;
use floatarb::simulator::jitter::{AmountJitter, FixedJitter, UniformJitter};
use floatarb::simulator::SimulationParams;
use floatarb::types::{OrderSide, OrderType, TimeInForce, VolatilitySource, MATURITY_DAYS};

use crate::mock_broker::{MockBroker, MockMarketData};

fn template() -> OrderTemplate {
    OrderTemplate {
        symbol: "SPY".into(),
        qty: dec!(1),
        side: OrderSide::Buy,
    }
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn engine_with(market: MockMarketData, executor: Executor) -> SessionEngine {
    SessionEngine::new(
        Box::new(SyntheticYieldFeed::new(42)),
        Box::new(market),
        executor,
    )
    .with_fixed_ticker("XLY")
    .with_start_date(start())
}

fn fixed_jitter() -> Box<dyn AmountJitter> {
    Box::new(FixedJitter(1.0))
}

#[tokio::test]
async fn test_cumulative_profit_is_running_sum() {
    let engine = engine_with(MockMarketData::constant(0.012), Executor::dry_run(template()))
        .with_jitter(Box::new(|| -> Box<dyn AmountJitter> { Box::new(UniformJitter::seeded(99)) }));
    let params = SimulationParams { horizon_days: 90, daily_spend: 85.0, trade_threshold: 1.0 };
    let report = engine.run(&params).await.unwrap();

    let mut running = 0.0;
    for rec in &report.records {
        running += rec.daily_profit;
        assert!((rec.cumulative_profit - running).abs() < 1e-9);
    }
    assert!((report.summary.final_cumulative_profit - running).abs() < 1e-9);
}

#[tokio::test]
async fn test_float_window_caps_total() {
    let engine = engine_with(MockMarketData::constant(0.0), Executor::dry_run(template()))
        .with_jitter(Box::new(fixed_jitter));
    let params = SimulationParams { horizon_days: 90, daily_spend: 50.0, trade_threshold: 10.0 };
    let report = engine.run(&params).await.unwrap();

    let window = MATURITY_DAYS as usize;
    for (i, rec) in report.records.iter().enumerate() {
        let active = (i + 1).min(window) as f64;
        assert!((rec.total_float - active * 50.0).abs() < 1e-9, "day {i}");
    }
}

#[tokio::test]
async fn test_market_data_outage_uses_fallback() {
    let engine = engine_with(MockMarketData::failing(), Executor::dry_run(template()))
        .with_jitter(Box::new(fixed_jitter));
    let params = SimulationParams { horizon_days: 30, daily_spend: 85.0, trade_threshold: 1.0 };
    let report = engine.run(&params).await.unwrap();

    assert_eq!(report.records.len(), 30);
    assert_eq!(report.volatility_source, VolatilitySource::Fallback);
    let multiplier = 1.0 + FALLBACK_VOLATILITY * 100.0;
    assert!(report.records.iter().all(|r| (r.vol_multiplier - multiplier).abs() < 1e-12));
}

#[tokio::test]
async fn test_orders_submitted_per_signal() {
    let broker = MockBroker::new();
    let executor = Executor::new(Some(Box::new(broker.clone())), template(), false);
    let engine = engine_with(MockMarketData::constant(0.01), executor).with_jitter(Box::new(fixed_jitter));
    let params = SimulationParams { horizon_days: 30, daily_spend: 100.0, trade_threshold: 2.0 };
    let report = engine.run(&params).await.unwrap();

    // Multiplier 2.0: income reaches 2.0 once 1000 of float is active (day 9).
    assert_eq!(report.trade_events.first().map(|e| e.day_index), Some(9));
    assert_eq!(report.trade_events.len(), 21);

    let orders = broker.orders();
    assert_eq!(orders.len(), report.trade_events.len());
    assert!(orders.iter().all(|o| o.order_type == OrderType::Market
        && o.time_in_force == TimeInForce::Gtc
        && o.symbol == "SPY"));
    assert_eq!(report.summary.trades_submitted, 21);
    assert_eq!(report.trade_log[0].message, "Buy 1 shares of SPY (order mock-1, accepted)");
}

#[tokio::test]
async fn test_broker_failures_do_not_abort() {
    let broker = MockBroker::rejecting_every(3);
    let executor = Executor::new(Some(Box::new(broker.clone())), template(), false);
    let engine = engine_with(MockMarketData::constant(0.01), executor).with_jitter(Box::new(fixed_jitter));
    let params = SimulationParams { horizon_days: 30, daily_spend: 100.0, trade_threshold: 2.0 };
    let report = engine.run(&params).await.unwrap();

    assert_eq!(report.records.len(), 30);
    assert_eq!(report.trade_log.len(), 21);
    assert_eq!(report.summary.trades_failed, 7);
    assert!(report.trade_log[2].message.starts_with("Trade failed:"));
    assert!(report.trade_log[2].message.contains("insufficient buying power"));
}

#[tokio::test]
async fn test_broker_down_every_trade_reported() {
    let broker = MockBroker::new();
    broker.set_error("503 Service Unavailable");
    let executor = Executor::new(Some(Box::new(broker.clone())), template(), false);
    let engine = engine_with(MockMarketData::constant(0.02), executor).with_jitter(Box::new(fixed_jitter));
    let params = SimulationParams { horizon_days: 14, daily_spend: 200.0, trade_threshold: 0.5 };
    let report = engine.run(&params).await.unwrap();

    assert!(!report.trade_log.is_empty());
    assert!(report.trade_log.iter().all(|t| !t.success));
    assert_eq!(report.summary.trades_submitted, 0);
    assert!(broker.orders().is_empty());
}

#[tokio::test]
async fn test_deterministic_with_fixed_jitter_and_seed() {
    let params = SimulationParams { horizon_days: 60, daily_spend: 85.0, trade_threshold: 1.5 };
    let a = engine_with(MockMarketData::constant(0.01), Executor::dry_run(template()))
        .with_jitter(Box::new(fixed_jitter))
        .run(&params)
        .await
        .unwrap();
    let b = engine_with(MockMarketData::constant(0.01), Executor::dry_run(template()))
        .with_jitter(Box::new(fixed_jitter))
        .run(&params)
        .await
        .unwrap();
    assert_eq!(a.records, b.records);
    assert_eq!(a.trade_events, b.trade_events);
    assert_eq!(a.summary, b.summary);
}

#[tokio::test]
async fn test_trade_signal_iff_threshold() {
    let engine = engine_with(MockMarketData::constant(0.005), Executor::dry_run(template()))
        .with_jitter(Box::new(|| -> Box<dyn AmountJitter> { Box::new(UniformJitter::seeded(5)) }));
    let params = SimulationParams { horizon_days: 45, daily_spend: 60.0, trade_threshold: 2.0 };
    let report = engine.run(&params).await.unwrap();

    let signalled: Vec<NaiveDate> = report.trade_events.iter().map(|e| e.date).collect();
    let expected: Vec<NaiveDate> = report
        .records
        .iter()
        .filter(|r| r.option_income >= params.trade_threshold)
        .map(|r| r.date)
        .collect();
    assert_eq!(signalled, expected);
}

#[tokio::test]
async fn test_sector_draw_picks_volatility_etf() {
    let engine = SessionEngine::new(
        Box::new(SyntheticYieldFeed::new(42)),
        Box::new(MockMarketData::constant(0.01)),
        Executor::dry_run(template()),
    )
    .with_sector_draw(Box::new(|| SectorDraw::seeded(77)))
    .with_start_date(start())
    .with_jitter(Box::new(fixed_jitter));
    let params = SimulationParams { horizon_days: 20, daily_spend: 85.0, trade_threshold: 3.5 };
    let report = engine.run(&params).await.unwrap();

    let sector = report.sector.expect("sector is drawn when no ticker is pinned");
    assert_eq!(sector, SectorDraw::seeded(77).next_sector());
    assert_eq!(report.ticker, sector.etf());
    assert!(["XLP", "XLY", "XLV"].contains(&report.ticker.as_str()));
    assert_eq!(
        report.volatility_source,
        VolatilitySource::Live { ticker: sector.etf().to_string() }
    );
}
