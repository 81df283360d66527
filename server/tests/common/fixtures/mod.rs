//! This module provides reusable test utilities:
//! - In-memory test databases with seeded customers and schedules
//! - Test configuration builders
//! - Recording conversation publishers
//! - Mock PayPal server
//! - Router harness for request/response tests

// Not every test binary uses every fixture
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_paypal;
pub mod recording;
pub mod test_app;
pub mod test_config;
pub mod test_data;
pub mod test_database;

// Re-export commonly used items
pub use mock_paypal::MockPayPalServer;
pub use recording::{FailingPublisher, RecordingPublisher};
pub use test_app::{TestApp, TestResponse};
pub use test_config::TestConfigBuilder;
pub use test_data::*;
pub use test_database::TestDatabase;
