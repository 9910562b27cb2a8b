//! Trade executor.
//!
//! Turns trade signals into market/GTC orders on the configured sink and
//! keeps a chronological log of human-readable outcomes. Submission
//! failures are recorded, never propagated.

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::broker::TradeSink;
use crate::types::{OrderSide, TradeEvent, TradeLogEntry, TradeOrder};

/// What to trade when a signal fires.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTemplate {
    pub symbol: String,
    pub qty: Decimal,
    pub side: OrderSide,
}

impl OrderTemplate {
    pub fn order(&self) -> TradeOrder {
        TradeOrder::market_gtc(&self.symbol, self.qty, self.side)
    }
}

pub struct Executor {
    sink: Option<Box<dyn TradeSink>>,
    template: OrderTemplate,
    dry_run: bool,
}

impl Executor {
    pub fn new(sink: Option<Box<dyn TradeSink>>, template: OrderTemplate, dry_run: bool) -> Self {
        Self {
            sink,
            template,
            dry_run,
        }
    }

    /// Executor that only logs what it would have traded.
    pub fn dry_run(template: OrderTemplate) -> Self {
        Self::new(None, template, true)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run || self.sink.is_none()
    }

    pub fn template(&self) -> &OrderTemplate {
        &self.template
    }

    /// Submit one order per event, in order. Returns one log entry per event.
    pub async fn execute_events(&self, events: &[TradeEvent]) -> Vec<TradeLogEntry> {
        let mut log = Vec::with_capacity(events.len());
        if events.is_empty() {
            return log;
        }

        info!(count = events.len(), dry_run = self.is_dry_run(), "Executing trade signals");

        for event in events {
            let order = self.template.order();

            let sink = match &self.sink {
                Some(sink) if !self.dry_run => sink,
                _ => {
                    info!(
                        date = %event.date,
                        order = %order,
                        option_income = format!("{:.2}", event.option_income),
                        "[DRY RUN] Would submit order"
                    );
                    log.push(TradeLogEntry {
                        date: event.date,
                        success: true,
                        message: format!("[DRY RUN] {}", order.describe()),
                    });
                    continue;
                }
            };

            match sink.submit_order(&order).await {
                Ok(receipt) => {
                    log.push(TradeLogEntry {
                        date: event.date,
                        success: true,
                        message: format!(
                            "{} (order {}, {})",
                            order.describe(),
                            receipt.order_id,
                            receipt.status
                        ),
                    });
                }
                Err(e) => {
                    warn!(
                        date = %event.date,
                        broker = sink.name(),
                        error = %e,
                        "Order submission failed"
                    );
                    log.push(TradeLogEntry {
                        date: event.date,
                        success: false,
                        message: format!("Trade failed: {e:#}"),
                    });
                }
            }
        }

        let submitted = log.iter().filter(|e| e.success).count();
        info!(
            submitted,
            failed = log.len() - submitted,
            "Trade signals processed"
        );

        log
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
