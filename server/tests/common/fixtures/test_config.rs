//! Test configuration builder for creating test configs programmatically

use server::config::Config;
use std::sync::Arc;

use super::test_data::OFFICE_KEY;

/// Builder for in-memory test configurations
pub struct TestConfigBuilder {
    config: Config,
}

impl TestConfigBuilder {
    /// Defaults with an office key, the cheapest bcrypt cost and open CORS
    pub fn new() -> Self {
        let mut config = Config::default();
        config.office_api_key = OFFICE_KEY.to_string();
        config.password_cost = 4;
        config.cors_origin = "*".to_string();
        config.public_base_url = "http://luber.test".to_string();
        Self { config }
    }

    /// Point PayPal at a mock server with test credentials
    pub fn with_paypal(mut self, base_url: &str) -> Self {
        self.config.paypal.client_id = "test-client".to_string();
        self.config.paypal.secret = "test-secret".to_string();
        self.config.paypal.base_url = Some(base_url.to_string());
        self
    }

    pub fn with_office_key(mut self, key: &str) -> Self {
        self.config.office_api_key = key.to_string();
        self
    }

    pub fn build(self) -> Arc<Config> {
        Arc::new(self.config)
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
