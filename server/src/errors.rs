//! Custom error types for the Luber platform
//!
//! Provides structured error handling with context for the account, scheduling,
//! payment and chat flows, plus the HTTP status each failure maps to.

use axum::http::StatusCode;
use std::fmt;

/// Main error type for the platform
#[derive(Debug)]
pub enum LuberError {
    /// Registration, login and profile errors
    Account(AccountError),

    /// Appointment lifecycle errors
    Schedule(ScheduleError),

    /// PayPal errors
    Payment(PaymentError),

    /// Conversation errors
    Chat(ChatError),

    /// Request validation errors
    Validation { field: String, reason: String },

    /// Missing or invalid session
    Unauthorized,

    /// Session does not own the requested resource
    Forbidden,

    /// Database operation errors
    Database(String),

    /// Other errors with context
    Other(String),
}

/// Account error variants
#[derive(Debug)]
pub enum AccountError {
    /// Email already belongs to another customer
    EmailTaken { email: String },

    /// Unknown email or wrong password
    InvalidCredentials,

    /// Customer record does not exist
    CustomerNotFound { customer_id: String },

    /// Vehicle does not exist or belongs to someone else
    VehicleNotFound { vehicle_id: String },

    /// Cancellation with the given timestamp does not exist
    CancellationNotFound { date: String },
}

/// Schedule error variants
#[derive(Debug)]
pub enum ScheduleError {
    /// Schedule does not exist
    NotFound { schedule_id: String },

    /// Schedule belongs to another customer
    NotOwner { schedule_id: String },

    /// Cancellation requested too close to the appointment
    TooLateToCancel { date: String },

    /// Office action not allowed from the current stage
    InvalidTransition {
        schedule_id: String,
        action: String,
        stage: String,
    },
}

/// Payment error variants
#[derive(Debug)]
pub enum PaymentError {
    /// PayPal credentials are not configured
    NotConfigured,

    /// OAuth token request failed
    TokenFailed { reason: String },

    /// Order creation failed
    CreateOrderFailed { reason: String },

    /// Order capture failed
    CaptureFailed { order_id: String, reason: String },
}

/// Chat error variants
#[derive(Debug)]
pub enum ChatError {
    /// Conversation does not exist
    ConversationNotFound { conversation_id: String },
}

impl LuberError {
    pub fn validation(field: &str, reason: &str) -> Self {
        LuberError::Validation {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status returned to API clients for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            LuberError::Account(e) => match e {
                AccountError::EmailTaken { .. } => StatusCode::BAD_REQUEST,
                AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AccountError::CustomerNotFound { .. }
                | AccountError::VehicleNotFound { .. }
                | AccountError::CancellationNotFound { .. } => StatusCode::NOT_FOUND,
            },
            LuberError::Schedule(e) => match e {
                ScheduleError::NotFound { .. } => StatusCode::NOT_FOUND,
                ScheduleError::NotOwner { .. } => StatusCode::FORBIDDEN,
                ScheduleError::TooLateToCancel { .. } => StatusCode::BAD_REQUEST,
                ScheduleError::InvalidTransition { .. } => StatusCode::CONFLICT,
            },
            LuberError::Payment(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LuberError::Chat(ChatError::ConversationNotFound { .. }) => StatusCode::NOT_FOUND,
            LuberError::Validation { .. } => StatusCode::BAD_REQUEST,
            LuberError::Unauthorized => StatusCode::UNAUTHORIZED,
            LuberError::Forbidden => StatusCode::FORBIDDEN,
            LuberError::Database(_) | LuberError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for LuberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuberError::Account(e) => write!(f, "{}", e),
            LuberError::Schedule(e) => write!(f, "{}", e),
            LuberError::Payment(e) => write!(f, "Payment error: {}", e),
            LuberError::Chat(e) => write!(f, "{}", e),
            LuberError::Validation { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            LuberError::Unauthorized => write!(f, "Not authorized"),
            LuberError::Forbidden => write!(f, "Forbidden"),
            LuberError::Database(msg) => write!(f, "Database error: {}", msg),
            LuberError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountError::EmailTaken { .. } => write!(f, "This email is already registered."),
            AccountError::InvalidCredentials => write!(f, "Invalid credentials"),
            AccountError::CustomerNotFound { customer_id } => {
                write!(f, "Customer '{}' not found", customer_id)
            }
            AccountError::VehicleNotFound { vehicle_id } => {
                write!(f, "Vehicle '{}' not found or not authorized", vehicle_id)
            }
            AccountError::CancellationNotFound { date } => {
                write!(f, "Cancellation at '{}' not found", date)
            }
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::NotFound { schedule_id } => {
                write!(f, "Appointment '{}' not found.", schedule_id)
            }
            ScheduleError::NotOwner { .. } => {
                write!(f, "You do not have permission for this appointment.")
            }
            ScheduleError::TooLateToCancel { .. } => {
                write!(f, "Cancel at least one day in advance.")
            }
            ScheduleError::InvalidTransition {
                schedule_id,
                action,
                stage,
            } => {
                write!(
                    f,
                    "Cannot {} appointment '{}' while it is {}",
                    action, schedule_id, stage
                )
            }
        }
    }
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentError::NotConfigured => write!(f, "PayPal credentials are not configured"),
            PaymentError::TokenFailed { reason } => {
                write!(f, "Could not obtain PayPal token: {}", reason)
            }
            PaymentError::CreateOrderFailed { reason } => {
                write!(f, "Could not create PayPal order: {}", reason)
            }
            PaymentError::CaptureFailed { order_id, reason } => {
                write!(f, "Could not capture PayPal order {}: {}", order_id, reason)
            }
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::ConversationNotFound { conversation_id } => {
                write!(f, "Conversation '{}' not found", conversation_id)
            }
        }
    }
}

impl std::error::Error for LuberError {}
impl std::error::Error for AccountError {}
impl std::error::Error for ScheduleError {}
impl std::error::Error for PaymentError {}
impl std::error::Error for ChatError {}

impl From<anyhow::Error> for LuberError {
    fn from(err: anyhow::Error) -> Self {
        LuberError::Other(err.to_string())
    }
}

impl From<sqlx::Error> for LuberError {
    fn from(err: sqlx::Error) -> Self {
        LuberError::Database(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for LuberError {
    fn from(err: tower_sessions::session::Error) -> Self {
        LuberError::Other(format!("Session error: {}", err))
    }
}

impl From<AccountError> for LuberError {
    fn from(err: AccountError) -> Self {
        LuberError::Account(err)
    }
}

impl From<ScheduleError> for LuberError {
    fn from(err: ScheduleError) -> Self {
        LuberError::Schedule(err)
    }
}

impl From<PaymentError> for LuberError {
    fn from(err: PaymentError) -> Self {
        LuberError::Payment(err)
    }
}

impl From<ChatError> for LuberError {
    fn from(err: ChatError) -> Self {
        LuberError::Chat(err)
    }
}
