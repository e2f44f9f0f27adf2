//! Thin client for the Razorpay Orders REST API.
//!
//! Razorpay has no Rust SDK, so the gateway is consumed directly over HTTP
//! with basic auth (`key_id:key_secret`). Only the order-creation call is
//! needed: all charge capture happens inside the hosted widget, which reports
//! back through the capture endpoint.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::common::error::{AppError, Res};

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a serde_json::Value,
}

/// An order as returned by `POST /v1/orders`. Amount is in paise.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(api_base: &str, key_id: &str, key_secret: &str) -> Self {
        RazorpayClient {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }

    /// The public key id, safe to hand to the checkout widget.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn auth_header(&self) -> String {
        let credentials = BASE64.encode(format!("{}:{}", self.key_id, self.key_secret));
        format!("Basic {}", credentials)
    }

    /// Creates a gateway order for `amount_paise`. The order id goes into the
    /// checkout options; nothing is persisted on our side.
    pub async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
        notes: &serde_json::Value,
    ) -> Res<GatewayOrder> {
        let body = CreateOrderRequest {
            amount: amount_paise,
            currency,
            receipt,
            notes,
        };

        let response = self
            .http
            .post(format!("{}/v1/orders", self.api_base))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "order creation failed: status={} body={}",
                status.as_u16(),
                body
            )));
        }

        let order = response.json::<GatewayOrder>().await?;
        log::info!(
            "Created gateway order {} for {} {}",
            order.id,
            order.amount,
            order.currency
        );
        Ok(order)
    }
}
