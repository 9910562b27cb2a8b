//! In-memory collaborators for integration testing.
//!
//! `MockBroker` accepts or rejects orders and records every submission;
//! `MockMarketData` serves a fixed volatility series or a forced error.
//! Clones share state, so a test can keep a handle after boxing one
//! into the engine.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use floatarb::broker::TradeSink;
use floatarb::data::MarketDataFeed;
use floatarb::types::{OrderReceipt, TradeOrder};

#[derive(Clone, Default)]
pub struct MockBroker {
    orders: Arc<Mutex<Vec<TradeOrder>>>,
    /// If set, every submission fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
    /// Reject every n-th submission (1-based), if set.
    reject_every: Option<usize>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_every(n: usize) -> Self {
        Self {
            reject_every: Some(n),
            ..Self::default()
        }
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn orders(&self) -> Vec<TradeOrder> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradeSink for MockBroker {
    async fn submit_order(&self, order: &TradeOrder) -> Result<OrderReceipt> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }

        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        let n = orders.len();

        if matches!(self.reject_every, Some(every) if n % every == 0) {
            return Err(anyhow!("order {n} rejected: insufficient buying power"));
        }

        Ok(OrderReceipt {
            order_id: format!("mock-{n}"),
            status: "accepted".to_string(),
            symbol: order.symbol.clone(),
            qty: order.qty,
            submitted_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "mock-broker"
    }
}

pub struct MockMarketData {
    values: Option<Vec<f64>>,
}

impl MockMarketData {
    /// Serves `value` for every requested day.
    pub fn constant(value: f64) -> Self {
        Self {
            values: Some(vec![value; 365]),
        }
    }

    /// Always fails, as an unreachable data provider would.
    pub fn failing() -> Self {
        Self { values: None }
    }
}

#[async_trait]
impl MarketDataFeed for MockMarketData {
    async fn fetch_volatility(&self, _ticker: &str, days: usize) -> Result<Vec<f64>> {
        match &self.values {
            Some(v) => Ok(v[..days.min(v.len())].to_vec()),
            None => Err(anyhow!("connection reset by peer")),
        }
    }

    fn name(&self) -> &str {
        "mock-market"
    }
}
