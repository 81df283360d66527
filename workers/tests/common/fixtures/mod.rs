//! Shared fixtures for the worker tests:
//! - Worker context over an in-memory database with recording seams
//! - Sample customers, vehicles and schedules
//! - Mock hub relay endpoint

// Not every test binary uses every fixture
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_relay;
pub mod recording;
pub mod test_context;
pub mod test_data;

pub use mock_relay::MockRelayServer;
pub use recording::{CapturingMailer, RecordingMailer, RecordingPublisher, SentMail};
pub use test_context::{test_config, TestContext};
pub use test_data::*;
