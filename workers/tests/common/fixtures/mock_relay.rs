//! Mock of the API server's conversation relay endpoint

use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockRelayServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockRelayServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Expects exactly `times` relay calls for the customer with the office key
    pub async fn expect_relay(&self, customer_id: &str, office_key: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/api/realtime/conversations/{}", customer_id)))
            .and(header("authorization", format!("Bearer {}", office_key).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "conversationId": "conv", "subscribers": 1 }
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Hub that is up but refuses every relay
    pub async fn reject_all(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&self.server)
            .await;
    }
}
