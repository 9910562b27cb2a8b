//! Alpaca paper-trading integration.
//!
//! API docs: https://docs.alpaca.markets/reference/postorder
//! Base URL: https://paper-api.alpaca.markets
//! Auth: `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY` headers on every request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use super::TradeSink;
use crate::types::{OrderReceipt, OrderSide, OrderType, TimeInForce, TradeOrder};

pub const PAPER_BASE_URL: &str = "https://paper-api.alpaca.markets";
const BROKER_NAME: &str = "alpaca";

// ---------------------------------------------------------------------------
// API request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    /// Alpaca takes fractional quantities as strings.
    qty: String,
    side: OrderSide,
    #[serde(rename = "type")]
    order_type: OrderType,
    time_in_force: TimeInForce,
    /// Idempotency key; Alpaca rejects a repeated id.
    client_order_id: String,
}

impl<'a> From<&'a TradeOrder> for OrderRequest<'a> {
    fn from(order: &'a TradeOrder) -> Self {
        Self {
            symbol: &order.symbol,
            qty: order.qty.normalize().to_string(),
            side: order.side,
            order_type: order.order_type,
            time_in_force: order.time_in_force,
            client_order_id: format!("floatarb-{}", uuid::Uuid::new_v4()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    qty: Option<String>,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Alpaca REST client. Credentials are passed in at construction.
pub struct AlpacaClient {
    http: Client,
    base_url: String,
    key_id: String,
    secret_key: Secret<String>,
}

impl AlpacaClient {
    pub fn new(key_id: String, secret_key: Secret<String>, base_url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("FLOATARB/0.1.0")
            .build()
            .context("Failed to build Alpaca HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or(PAPER_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            key_id,
            secret_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TradeSink for AlpacaClient {
    async fn submit_order(&self, order: &TradeOrder) -> Result<OrderReceipt> {
        let body = OrderRequest::from(order);

        let resp = self
            .http
            .post(format!("{}/v2/orders", self.base_url))
            .header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", self.secret_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Alpaca order request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            anyhow::bail!("Alpaca rejected order {status}: {reason}");
        }

        let placed: OrderResponse = resp
            .json()
            .await
            .context("Failed to parse Alpaca order response")?;

        let receipt = receipt_from_response(placed, order);
        info!(
            order_id = %receipt.order_id,
            symbol = %receipt.symbol,
            qty = %receipt.qty,
            status = %receipt.status,
            "Alpaca order submitted"
        );
        Ok(receipt)
    }

    fn name(&self) -> &str {
        BROKER_NAME
    }
}

fn receipt_from_response(placed: OrderResponse, order: &TradeOrder) -> OrderReceipt {
    let qty = placed
        .qty
        .as_deref()
        .and_then(|q| Decimal::from_str(q).ok())
        .unwrap_or(order.qty);
    let symbol = if placed.symbol.is_empty() {
        order.symbol.clone()
    } else {
        placed.symbol
    };
    OrderReceipt {
        order_id: placed.id,
        status: placed.status,
        symbol,
        qty,
        submitted_at: placed.submitted_at.unwrap_or_else(Utc::now),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
