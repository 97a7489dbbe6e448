use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::BillingError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderCreated {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderCreated, BillingError>;

    /// Public key handed to the payer's checkout.
    fn key_id(&self) -> String;
}

/// Orders API client with HTTP basic auth.
pub struct RazorpayGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.gateway_base_url.trim_end_matches('/').to_string(),
            key_id: config.gateway_key_id.clone(),
            key_secret: config.gateway_key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderCreated, BillingError> {
        if self.key_id.is_empty() || self.key_secret.is_empty() {
            return Err(BillingError::GatewayNotConfigured);
        }

        let url = format!("{}/v1/orders", self.base_url);
        debug!("Creating gateway order for receipt {}", request.receipt);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| BillingError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gateway order failed with {}: {}", status, body);
            return Err(BillingError::Gateway(format!("order creation failed: {}", status)));
        }

        response
            .json::<OrderCreated>()
            .await
            .map_err(|e| BillingError::Gateway(format!("unreadable order response: {}", e)))
    }

    fn key_id(&self) -> String {
        self.key_id.clone()
    }
}

// ==============================================================================
// CALLBACK SIGNATURES
// ==============================================================================

/// Hex HMAC-SHA256 of `order_ref|payment_ref`.
pub fn sign_payment(secret: &str, order_ref: &str, payment_ref: &str) -> Result<String, BillingError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::GatewayNotConfigured)?;
    mac.update(format!("{}|{}", order_ref, payment_ref).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_payment_signature(
    secret: &str,
    order_ref: &str,
    payment_ref: &str,
    signature: &str,
) -> Result<(), BillingError> {
    let signature = hex::decode(signature.trim()).map_err(|_| BillingError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::GatewayNotConfigured)?;
    mac.update(format!("{}|{}", order_ref, payment_ref).as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| BillingError::InvalidSignature)
}
