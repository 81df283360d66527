//! Appointment lifecycle.
//!
//! A schedule carries no explicit state column; its stage is derived from the
//! flags the server and the workers set on it. The workers select their work
//! with the predicates below and the office actions go through
//! [`check_transition`] before any flag is written.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::database::{AccountType, ScheduleRecord};
use crate::errors::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Customer schedule waiting for its PayPal capture
    AwaitingPayment,
    /// Fleet schedule waiting for office approval
    PendingApproval,
    /// Fleet schedule approved by the office
    Confirmed,
    /// Customer schedule with a captured payment
    Paid,
    /// Fleet schedule serviced and waiting for its invoice
    Processed,
    /// Fleet schedule with an invoice attached
    Invoiced,
    /// Service done, waiting to be archived
    Completed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AwaitingPayment => "awaiting payment",
            Stage::PendingApproval => "pending approval",
            Stage::Confirmed => "confirmed",
            Stage::Paid => "paid",
            Stage::Processed => "processed",
            Stage::Invoiced => "invoiced",
            Stage::Completed => "completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeAction {
    Confirm,
    Process,
    AttachInvoice,
    Complete,
    MarkPaid,
    OpenPayment,
}

impl OfficeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfficeAction::Confirm => "confirm",
            OfficeAction::Process => "process",
            OfficeAction::AttachInvoice => "attach an invoice to",
            OfficeAction::Complete => "complete",
            OfficeAction::MarkPaid => "mark as paid",
            OfficeAction::OpenPayment => "open a payment for",
        }
    }
}

fn is_fleet(schedule: &ScheduleRecord) -> bool {
    schedule.account_type == AccountType::Fleet
}

fn has_invoice(schedule: &ScheduleRecord) -> bool {
    schedule
        .invoice_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty())
}

pub fn stage(schedule: &ScheduleRecord) -> Stage {
    if schedule.completed {
        Stage::Completed
    } else if is_fleet(schedule) && has_invoice(schedule) {
        Stage::Invoiced
    } else if schedule.processed {
        Stage::Processed
    } else if !is_fleet(schedule) && schedule.paid {
        Stage::Paid
    } else if is_fleet(schedule) && schedule.confirmed {
        Stage::Confirmed
    } else if is_fleet(schedule) {
        Stage::PendingApproval
    } else {
        Stage::AwaitingPayment
    }
}

pub fn needs_pending_notice(schedule: &ScheduleRecord) -> bool {
    is_fleet(schedule) && !schedule.fleet_notified
}

pub fn needs_processed_notice(schedule: &ScheduleRecord) -> bool {
    is_fleet(schedule) && schedule.processed && !schedule.fleet_processed_notified
}

pub fn needs_invoice_notice(schedule: &ScheduleRecord) -> bool {
    is_fleet(schedule) && has_invoice(schedule) && !schedule.invoice_sent_notified
}

pub fn needs_confirmation_notice(schedule: &ScheduleRecord) -> bool {
    !is_fleet(schedule) && schedule.paid && !schedule.confirmation_notified
}

pub fn is_unpaid_expired(schedule: &ScheduleRecord, now: DateTime<Utc>, grace: Duration) -> bool {
    !is_fleet(schedule)
        && !schedule.paid
        && !schedule.completed
        && schedule.created_at + grace <= now
}

pub fn is_ready_to_archive(schedule: &ScheduleRecord) -> bool {
    schedule.completed
}

/// Rejects an office action the schedule's current stage does not allow
pub fn check_transition(schedule: &ScheduleRecord, action: OfficeAction) -> Result<(), ScheduleError> {
    let current = stage(schedule);

    let allowed = match action {
        OfficeAction::Confirm | OfficeAction::Process => {
            is_fleet(schedule) && current != Stage::Completed
        }
        OfficeAction::AttachInvoice => {
            is_fleet(schedule) && schedule.processed && current != Stage::Completed
        }
        OfficeAction::Complete => match schedule.account_type {
            _ if current == Stage::Completed => false,
            AccountType::Customer => schedule.paid,
            AccountType::Fleet => true,
        },
        OfficeAction::MarkPaid => !is_fleet(schedule) && current != Stage::Completed,
        OfficeAction::OpenPayment => current == Stage::AwaitingPayment,
    };

    if allowed {
        Ok(())
    } else {
        Err(ScheduleError::InvalidTransition {
            schedule_id: schedule.id.clone(),
            action: action.as_str().to_string(),
            stage: current.to_string(),
        })
    }
}
