//! Database record types (entities).
//!
//! These mirror the documents the platform shares between the API server and
//! the workers. Nested parts of a document (vehicle lines, offer prices,
//! service intervals) are persisted as JSON text columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AccountType {
    #[default]
    Customer,
    Fleet,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Customer => "Customer",
            AccountType::Fleet => "Fleet",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("fleet") {
            AccountType::Fleet
        } else {
            AccountType::Customer
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    pub account_type: AccountType,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub office_phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_picture_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: String,
    pub customer_id: String,
    pub brand: String,
    pub year: i64,
    pub model: String,
    pub engine: String,
    pub color: String,
    pub plate_last3: String,
    pub vin: String,
    pub vin_image_url: String,
    pub vehicle_image_url: String,
    pub service_intervals: Vec<i64>,
    pub interval: i64,
    pub base_interval: i64,
    pub milage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CancelledVehicle {
    pub brand: String,
    pub model: String,
    pub plate_last3: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRecord {
    pub date: DateTime<Utc>,
    pub service_name: String,
    pub vehicle_info: CancelledVehicle,
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OilChangeRecord {
    pub customer_id: String,
    pub schedule_id: String,
    pub date: String,
    pub time: String,
    pub total: f64,
    pub offer_price: Vec<f64>,
    pub client_address: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub service_milage: Option<i64>,
    pub vehicle: Option<ScheduleVehicle>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub description2: String,
    pub details: String,
    pub notes: String,
    pub price_from: f64,
    pub price_to: f64,
    pub oil_capacity_from: f64,
    pub oil_capacity_to: f64,
    pub category: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLogRecord {
    pub customer_id: String,
    pub full_name: String,
    pub email: String,
    pub account_type: AccountType,
    pub ip: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeNotificationRecord {
    pub customer_id: String,
    pub email: String,
    pub full_name: String,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    pub message_id: String,
}

// ============================================================================
// Schedules
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OilType {
    Blend,
    #[serde(rename = "Full Synthetic")]
    FullSynthetic,
}

impl OilType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OilType::Blend => "Blend",
            OilType::FullSynthetic => "Full Synthetic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub plate_last3: String,
    #[serde(default)]
    pub vehicle_image_url: String,
    #[serde(default)]
    pub vin_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleVehicle {
    pub vehicle_id: String,
    pub service_id: String,
    pub oil_type: OilType,
    pub price: f64,
    #[serde(default)]
    pub air_filter: bool,
    #[serde(default)]
    pub cabin_filter: bool,
    #[serde(default)]
    pub service_address: String,
    #[serde(default)]
    pub vehicle_info: VehicleInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub id: String,
    pub customer_id: String,
    pub account_type: AccountType,
    pub customer_name: String,
    pub email: Option<String>,
    pub date: String,
    pub time: String,
    pub total: f64,
    pub client_address: String,
    pub offer_price: Vec<f64>,
    pub secured: bool,
    pub reserved: bool,
    pub vehicles: Vec<ScheduleVehicle>,
    pub confirmed: bool,
    pub paid: bool,
    pub processed: bool,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub service_milage: Option<i64>,
    pub invoice_id: Option<String>,
    pub paypal_order_id: Option<String>,
    pub fleet_notified: bool,
    pub fleet_processed_notified: bool,
    pub invoice_sent_notified: bool,
    pub confirmation_notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedScheduleRecord {
    #[serde(flatten)]
    pub schedule: ScheduleRecord,
    pub moved_at: DateTime<Utc>,
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Customer,
    Office,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Customer => "customer",
            Sender::Office => "office",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value == "customer" {
            Sender::Customer
        } else {
            Sender::Office
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub image_url: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub archived: bool,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn customer_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == Sender::Customer)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    #[default]
    Partial,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Partial => "partial",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value == "exact" {
            MatchType::Exact
        } else {
            MatchType::Partial
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotReplyRecord {
    pub question: String,
    pub answer: String,
    #[serde(rename = "type")]
    pub match_type: MatchType,
}
