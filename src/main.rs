//! FLOATARB: cash-float arbitrage simulator.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires feeds and the broker, then either serves the dashboard until
//! Ctrl+C or runs a single session and prints the results.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use floatarb::config;
use floatarb::dashboard::{self, routes::DashboardState};
use floatarb::engine::report::SessionReport;
use floatarb::engine::session::SessionEngine;

const BANNER: &str = r#"
 _____ _     ___    _  _____  _    ____  ____
|  ___| |   / _ \  / \|_   _|/ \  |  _ \| __ )
| |_  | |  | | | |/ _ \ | | / _ \ | |_) |  _ \
|  _| | |__| |_| / ___ \| |/ ___ \|  _ <| |_) |
|_|   |_____\___/_/   \_\_/_/   \_\_| \_\____/

  Cash-float arbitrage simulator
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("FLOATARB_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        horizon_days = cfg.simulation.horizon_days,
        daily_spend = cfg.simulation.daily_spend,
        trade_threshold = cfg.simulation.trade_threshold,
        yields = ?cfg.yields.source,
        ticker = ?cfg.market_data.ticker,
        trading = cfg.trading.enabled,
        "FLOATARB starting up"
    );

    let engine = SessionEngine::from_config(&cfg)?;

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(engine, cfg.simulation_params()));
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
            }
            info!("Shutdown signal received.");
        };
        dashboard::serve_dashboard(state, cfg.dashboard.port, shutdown).await?;
    } else {
        let report = engine.run(&cfg.simulation_params()).await?;
        print_report(&report);
    }

    info!("FLOATARB shut down cleanly.");
    Ok(())
}

/// Print the daily table, trade log and totals to stdout.
fn print_report(report: &SessionReport) {
    match report.sector {
        Some(sector) => println!("Sector: {sector} ({})", report.ticker),
        None => println!("Ticker: {}", report.ticker),
    }
    println!("Daily summary (volatility: {})", report.volatility_source);
    for row in report.summary_rows() {
        println!("  {row}");
    }

    println!();
    println!("Trade log");
    if report.trade_log.is_empty() {
        println!("  (no signals)");
    }
    for entry in &report.trade_log {
        println!("  {entry}");
    }

    let s = &report.summary;
    println!();
    println!("Cumulative profit:   ${:.2}", s.final_cumulative_profit);
    println!("Option income:       ${:.2}", s.total_option_income);
    println!("Yield income:        ${:.2}", s.total_yield_income);
    println!("Peak active float:   ${:.2}", s.peak_total_float);
    println!("Avg daily profit:    ${:.2}", s.average_daily_profit);
    println!(
        "Trades:              {} signals, {} submitted, {} failed",
        s.trade_signals, s.trades_submitted, s.trades_failed
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("floatarb=info"));

    let json_logging = std::env::var("FLOATARB_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
