//! Brokerage integrations.
//!
//! Defines the `TradeSink` trait the executor submits orders through, and
//! provides an implementation for:
//! - Alpaca: paper-trading REST API

pub mod alpaca;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{OrderReceipt, TradeOrder};

/// Abstraction over an order-accepting brokerage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeSink: Send + Sync {
    /// Submit an order. Errors carry the broker's reason.
    async fn submit_order(&self, order: &TradeOrder) -> Result<OrderReceipt>;

    /// Broker name for logging and identification.
    fn name(&self) -> &str;
}
