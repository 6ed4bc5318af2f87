//! Premium purchases through an external payment gateway.
//!
//! Only order creation talks to the gateway. Settlement arrives through the
//! client-relayed callbacks in `handlers`.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, instrument, warn};

use crate::config::PaymentConfig;
use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// An order as created by the gateway. `amount` is in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the client checkout widget.
    fn key_id(&self) -> Option<&str>;

    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, AppError>;
}

pub fn from_config(config: &PaymentConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
    match (&config.key_id, &config.key_secret) {
        (Some(key_id), Some(key_secret)) => {
            info!("Payment gateway configured at {}", config.api_url);
            Ok(Arc::new(RazorpayGateway::new(
                config.api_url.clone(),
                key_id.clone(),
                key_secret.clone(),
            )?))
        }
        _ => {
            warn!("PAYMENT_KEY_ID/PAYMENT_KEY_SECRET not set; premium purchases are disabled");
            Ok(Arc::new(UnconfiguredGateway))
        }
    }
}

/// Checks a callback signature: hex HMAC-SHA256 of `"{order_id}|{payment_id}"`.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay-compatible REST client (basic auth with key id and secret).
pub struct RazorpayGateway {
    client: Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(api_url: String, key_id: String, key_secret: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> Option<&str> {
        Some(&self.key_id)
    }

    #[instrument(skip(self))]
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, AppError> {
        let response = self
            .client
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderRequest {
                amount,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let order: GatewayOrder = response
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("unreadable order response: {e}")))?;
        debug!(order_id = %order.id, "Gateway order created");
        Ok(order)
    }
}

/// Stand-in when no gateway credentials are configured.
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    fn key_id(&self) -> Option<&str> {
        None
    }

    async fn create_order(
        &self,
        _amount: i64,
        _currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, AppError> {
        Err(AppError::Payment(
            "payment gateway is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
pub(crate) fn sign_for_tests(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
