//! Session engine: fetch feeds, simulate, execute signals, report.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use secrecy::Secret;
use tracing::{info, warn};

use crate::broker::alpaca::AlpacaClient;
use crate::broker::TradeSink;
use crate::config::{AppConfig, YieldSourceKind};
use crate::data::sector::{Sector, SectorDraw};
use crate::data::volatility::YahooVolatilityFeed;
use crate::data::yields::{FredYieldFeed, SyntheticYieldFeed, DEFAULT_YIELD_NOISE};
use crate::data::{volatility_or_fallback, MarketDataFeed, YieldFeed};
use crate::engine::executor::{Executor, OrderTemplate};
use crate::engine::report::SessionReport;
use crate::simulator::jitter::{AmountJitter, UniformJitter};
use crate::simulator::{FloatSimulator, SimulationParams};

/// Feed that always fails, used when live market data is switched off so
/// runs take the regular fallback path.
struct DisabledMarketData;

#[async_trait::async_trait]
impl MarketDataFeed for DisabledMarketData {
    async fn fetch_volatility(&self, _ticker: &str, _days: usize) -> Result<Vec<f64>> {
        anyhow::bail!("market data disabled in configuration")
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Builds a jitter source for each run.
pub type JitterFactory = Box<dyn Fn() -> Box<dyn AmountJitter> + Send + Sync>;
/// Builds the sector draw for each run.
pub type SectorFactory = Box<dyn Fn() -> SectorDraw + Send + Sync>;

pub struct SessionEngine {
    yield_feed: Box<dyn YieldFeed>,
    market_feed: Box<dyn MarketDataFeed>,
    executor: Executor,
    /// Pinned volatility ticker. Unset means one sector ETF is drawn per run.
    fixed_ticker: Option<String>,
    sectors: SectorFactory,
    start_date: Option<NaiveDate>,
    jitter: JitterFactory,
}

impl SessionEngine {
    pub fn new(
        yield_feed: Box<dyn YieldFeed>,
        market_feed: Box<dyn MarketDataFeed>,
        executor: Executor,
    ) -> Self {
        Self {
            yield_feed,
            market_feed,
            executor,
            fixed_ticker: None,
            sectors: Box::new(SectorDraw::from_entropy),
            start_date: None,
            jitter: Box::new(|| -> Box<dyn AmountJitter> { Box::new(UniformJitter::from_entropy()) }),
        }
    }

    /// Always use `ticker` for volatility instead of drawing a sector.
    pub fn with_fixed_ticker(mut self, ticker: &str) -> Self {
        self.fixed_ticker = Some(ticker.to_string());
        self
    }

    pub fn with_sector_draw(mut self, sectors: SectorFactory) -> Self {
        self.sectors = sectors;
        self
    }

    /// Pin the first simulated day instead of using today.
    pub fn with_start_date(mut self, start: NaiveDate) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_jitter(mut self, jitter: JitterFactory) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wire real feeds and the broker from configuration.
    ///
    /// Secrets are resolved here, once, and handed to the clients.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let yield_feed: Box<dyn YieldFeed> = match cfg.yields.source {
            YieldSourceKind::Synthetic => Box::new(SyntheticYieldFeed::with_noise(
                cfg.yields.seed,
                cfg.yields.noise.unwrap_or(DEFAULT_YIELD_NOISE),
            )),
            YieldSourceKind::Fred => {
                let env = cfg
                    .yields
                    .fred_api_key_env
                    .as_deref()
                    .context("yields.fred_api_key_env is required for the FRED source")?;
                let key = AppConfig::resolve_env(env)?;
                Box::new(FredYieldFeed::new(Secret::new(key))?)
            }
        };

        let market_feed: Box<dyn MarketDataFeed> = if cfg.market_data.enabled {
            match cfg.market_data.base_url.as_deref() {
                Some(url) => Box::new(YahooVolatilityFeed::with_base_url(url)?),
                None => Box::new(YahooVolatilityFeed::new()?),
            }
        } else {
            Box::new(DisabledMarketData)
        };

        let template = OrderTemplate {
            symbol: cfg.trading.symbol.clone(),
            qty: cfg.trading.qty,
            side: cfg.trading.side,
        };

        let sink: Option<Box<dyn TradeSink>> = if cfg.trading.enabled {
            match (
                AppConfig::resolve_env(&cfg.trading.key_id_env),
                AppConfig::resolve_env(&cfg.trading.secret_key_env),
            ) {
                (Ok(key_id), Ok(secret)) => Some(Box::new(AlpacaClient::new(
                    key_id,
                    Secret::new(secret),
                    cfg.trading.base_url.as_deref(),
                )?)),
                _ => {
                    warn!(
                        key_env = %cfg.trading.key_id_env,
                        secret_env = %cfg.trading.secret_key_env,
                        "Broker credentials missing, trading in dry-run mode"
                    );
                    None
                }
            }
        } else {
            None
        };

        let executor = Executor::new(sink, template, cfg.trading.dry_run);
        let mut engine = Self::new(yield_feed, market_feed, executor);

        if let Some(ticker) = cfg.market_data.ticker.as_deref() {
            engine = engine.with_fixed_ticker(ticker);
        }
        let sector_seed = cfg.market_data.sector_seed;
        engine = engine.with_sector_draw(Box::new(move || SectorDraw::from_seed_option(sector_seed)));

        if let Some(start) = cfg.simulation.start_date {
            engine = engine.with_start_date(start);
        }
        let seed = cfg.simulation.jitter_seed;
        engine = engine.with_jitter(Box::new(move || -> Box<dyn AmountJitter> {
            Box::new(UniformJitter::from_seed_option(seed))
        }));

        Ok(engine)
    }

    /// Volatility ticker for one run, with the sector it was drawn for.
    fn choose_ticker(&self) -> (Option<Sector>, String) {
        match &self.fixed_ticker {
            Some(ticker) => (None, ticker.clone()),
            None => {
                let sector = (self.sectors)().next_sector();
                info!(sector = %sector, etf = sector.etf(), "Sector drawn for session");
                (Some(sector), sector.etf().to_string())
            }
        }
    }

    /// Run one complete session.
    ///
    /// Volatility failures fall back to a constant series and trade
    /// failures land in the trade log; yield feed and simulation errors
    /// abort the session.
    pub async fn run(&self, params: &SimulationParams) -> Result<SessionReport> {
        info!(
            horizon_days = params.horizon_days,
            daily_spend = params.daily_spend,
            trade_threshold = params.trade_threshold,
            "Starting session"
        );

        let yields = self
            .yield_feed
            .fetch_yields(params.horizon_days)
            .await
            .with_context(|| format!("{} yield feed failed", self.yield_feed.name()))?;

        let (sector, ticker) = self.choose_ticker();
        let volatility =
            volatility_or_fallback(&*self.market_feed, &ticker, params.horizon_days).await;

        let start = self.start_date.unwrap_or_else(|| Local::now().date_naive());
        let mut simulator = FloatSimulator::new(start, (self.jitter)());
        let output = simulator
            .run(params, &yields, &volatility)
            .context("Simulation failed")?;

        let trade_log = self.executor.execute_events(&output.trade_events).await;

        let report = SessionReport::new(
            params.clone(),
            self.yield_feed.name(),
            sector,
            ticker,
            volatility.source.clone(),
            output,
            trade_log,
        );

        info!(
            days = report.summary.days,
            cumulative_profit = format!("${:.2}", report.summary.final_cumulative_profit),
            signals = report.summary.trade_signals,
            submitted = report.summary.trades_submitted,
            failed = report.summary.trades_failed,
            ticker = %report.ticker,
            volatility = %report.volatility_source,
            "Session complete"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
