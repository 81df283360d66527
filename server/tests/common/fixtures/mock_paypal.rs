//! Mock PayPal REST server
//!
//! Serves the OAuth token, order creation and order capture endpoints so the
//! checkout flow can run without the sandbox.

use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_TOKEN: &str = "A21AAtest-token";

pub struct MockPayPalServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockPayPalServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Token endpoint accepting client credentials
    pub async fn mock_token(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TEST_TOKEN,
                "token_type": "Bearer",
                "expires_in": 32400
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_token_rejected(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_client"
            })))
            .mount(&self.server)
            .await;
    }

    /// Order creation returning `order_id` and an approve link
    pub async fn mock_create_order(&self, order_id: &str) {
        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .and(body_string_contains("\"intent\":\"CAPTURE\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": order_id,
                "status": "CREATED",
                "links": [
                    { "href": format!("https://api.sandbox/orders/{}", order_id), "rel": "self" },
                    { "href": approve_link(order_id), "rel": "approve" }
                ]
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_order_failure(&self) {
        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.server)
            .await;
    }

    /// Number of order creation calls PayPal has seen so far
    pub async fn created_orders(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/v2/checkout/orders")
            .count()
    }

    /// Capture of `order_id` whose first purchase unit references `schedule_id`
    pub async fn mock_capture(&self, order_id: &str, schedule_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v2/checkout/orders/{}/capture", order_id)))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": order_id,
                "status": "COMPLETED",
                "purchase_units": [{ "reference_id": schedule_id }]
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_capture_failure(&self, order_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v2/checkout/orders/{}/capture", order_id)))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "name": "UNPROCESSABLE_ENTITY"
            })))
            .mount(&self.server)
            .await;
    }
}

pub fn approve_link(order_id: &str) -> String {
    format!("https://www.sandbox.paypal.com/checkoutnow?token={}", order_id)
}
