//! PayPal REST client for the checkout flow: OAuth token, order creation and
//! order capture.

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::PayPalConfig;
use crate::constants::{http, paypal};
use crate::errors::PaymentError;

#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub id: String,
    #[serde(rename = "approveLink")]
    pub approve_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CapturedOrder {
    pub id: String,
    pub status: String,
    /// Schedule id carried as the first purchase unit's reference id
    pub reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OrderLink {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    links: Vec<OrderLink>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    reference_id: Option<String>,
}

#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    base_url: String,
    client_id: String,
    secret: String,
    public_base_url: String,
}

impl PayPalClient {
    pub fn new(config: &PayPalConfig, public_base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(http::PAYPAL_TIMEOUT).build()?;

        let base_url = match &config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if config.mode == "live" => paypal::LIVE_BASE_URL.to_string(),
            None => paypal::SANDBOX_BASE_URL.to_string(),
        };

        Ok(Self {
            client,
            base_url,
            client_id: config.client_id.clone(),
            secret: config.secret.clone(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.secret.is_empty()
    }

    async fn access_token(&self) -> Result<String, PaymentError> {
        if !self.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentError::TokenFailed {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PaymentError::TokenFailed {
                reason: format!("HTTP {}", status),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| PaymentError::TokenFailed {
            reason: e.to_string(),
        })?;
        debug!("Obtained PayPal access token");
        Ok(token.access_token)
    }

    /// Creates a CAPTURE order for `total` dollars tagged with the schedule id
    pub async fn create_order(
        &self,
        schedule_id: &str,
        total: f64,
    ) -> Result<CreatedOrder, PaymentError> {
        let token = self.access_token().await?;

        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": schedule_id,
                "amount": {
                    "currency_code": paypal::CURRENCY,
                    "value": format!("{:.2}", total),
                }
            }],
            "application_context": {
                "return_url": format!("{}/api/paypal/capture-order", self.public_base_url),
                "cancel_url": format!("{}/customer.html", self.public_base_url),
            }
        });

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::CreateOrderFailed {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("PayPal order creation failed: HTTP {} {}", status, text);
            return Err(PaymentError::CreateOrderFailed {
                reason: format!("HTTP {}", status),
            });
        }

        let order: OrderResponse =
            response
                .json()
                .await
                .map_err(|e| PaymentError::CreateOrderFailed {
                    reason: e.to_string(),
                })?;

        let approve_link = order
            .links
            .into_iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href);

        info!("Created PayPal order {} for schedule {}", order.id, schedule_id);
        Ok(CreatedOrder {
            id: order.id,
            approve_link,
        })
    }

    pub async fn capture_order(&self, order_id: &str) -> Result<CapturedOrder, PaymentError> {
        let token = self.access_token().await?;
        let capture_failed = |reason: String| PaymentError::CaptureFailed {
            order_id: order_id.to_string(),
            reason,
        };

        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, order_id
            ))
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await
            .map_err(|e| capture_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(capture_failed(format!("HTTP {}", response.status())));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| capture_failed(e.to_string()))?;

        let reference_id = order
            .purchase_units
            .into_iter()
            .next()
            .and_then(|unit| unit.reference_id);

        info!(
            "Captured PayPal order {} ({}), reference {:?}",
            order.id, order.status, reference_id
        );
        Ok(CapturedOrder {
            id: order.id,
            status: order.status,
            reference_id,
        })
    }
}
