//! Central repository for business constants and default configuration values
//!
//! Organized by category so the lifecycle rules, worker cadences and
//! integration timeouts have a single source of truth.

use std::time::Duration;

/// Pricing and booking rules
pub mod booking {
    /// Share of each vehicle line price offered as the secured deposit
    pub const OFFER_RATE: f64 = 0.30;

    /// First bookable hour of the day (24h clock)
    pub const FIRST_SLOT_HOUR: u32 = 9;

    /// Last bookable hour of the day (24h clock)
    pub const LAST_SLOT_HOUR: u32 = 21;

    /// Minimum days between today and the appointment for a cancellation
    pub const CANCELLATION_NOTICE_DAYS: i64 = 1;

    /// Days a fleet customer has to pay an invoice
    pub const INVOICE_PAYMENT_DAYS: u32 = 30;

    /// Service name recorded when the catalogue entry no longer exists
    pub const UNKNOWN_SERVICE_NAME: &str = "Unknown service";
}

/// Chat relay and bot constants
pub mod chat {
    /// Prefix for every automatic bot reply
    pub const BOT_PREFIX: &str = "🤖 ";

    /// Reply sent when the first customer message matches no bot reply
    pub const FIRST_MESSAGE_REPLY: &str =
        "Thanks for your message. An advisor will be with you shortly.";

    /// Capacity of the conversation broadcast channel
    pub const HUB_CHANNEL_CAPACITY: usize = 256;

    /// Event name pushed on every conversation change
    pub const CONVERSATION_UPDATE_EVENT: &str = "conversation_update";

    /// Event name pushed to a freshly connected socket
    pub const CONVERSATION_LIST_EVENT: &str = "conversation_list";
}

/// PayPal integration constants
pub mod paypal {
    pub const LIVE_BASE_URL: &str = "https://api-m.paypal.com";
    pub const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
    pub const CURRENCY: &str = "USD";
    pub const INVOICE_LINK_BASE: &str = "https://www.paypal.com/invoice/p/#";
}

/// HTTP client timeouts
pub mod http {
    use super::Duration;

    /// Timeout for PayPal REST calls
    pub const PAYPAL_TIMEOUT: Duration = Duration::from_secs(30);

    /// Timeout for worker-to-hub relay calls
    pub const RELAY_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Worker constants
pub mod workers {
    /// Number of moved schedules kept in the mover history
    pub const MOVED_HISTORY_LIMIT: usize = 50;
}

/// Default configuration values
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 3006;
    pub const WORKERS_PORT: u16 = 5000;
    pub const DATABASE_PATH: &str = "data/luber.db";
    pub const PUBLIC_BASE_URL: &str = "http://localhost:3006";
    pub const CORS_ORIGIN: &str = "http://localhost:3000";
    pub const PASSWORD_COST: u32 = 10;
    pub const SESSION_INACTIVITY_DAYS: i64 = 7;
    pub const UNPAID_GRACE_MINUTES: i64 = 30;
    pub const TIMEZONE: &str = "America/New_York";
    pub const SMTP_PORT: u16 = 587;

    pub const COMPLETED_MOVER_SCHEDULE: &str = "*/10 * * * * *";
    pub const FLEET_NOTIFIER_SCHEDULE: &str = "*/30 * * * * *";
    pub const UNPAID_REMOVER_SCHEDULE: &str = "0 * * * * *";
    pub const OIL_CHANGES_SCHEDULE: &str = "30 * * * * *";
    pub const WELCOME_MAILER_SCHEDULE: &str = "*/10 * * * * *";
    pub const CONFIRMATION_NOTIFIER_SCHEDULE: &str = "*/5 * * * * *";
}
