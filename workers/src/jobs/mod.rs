//! Periodic worker passes.
//!
//! Every worker exposes `run_once`, which performs a single pass and returns
//! how many records it acted on. Failures on a single record are logged and
//! the pass moves on; only failures to load the work list abort a pass.

pub mod completed_mover;
pub mod confirmation_notifier;
pub mod fleet_notifier;
pub mod oil_changes;
pub mod unpaid_remover;
pub mod welcome_mailer;

use anyhow::Result;
use serde::Serialize;
use server::config::{JobConfig, WorkersConfig};
use server::database::{NotificationFlag, ScheduleRecord};
use server::messages::Notice;
use server::services::deliver_email;

use crate::context::WorkerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    CompletedMover,
    FleetNotifier,
    UnpaidRemover,
    OilChanges,
    WelcomeMailer,
    ConfirmationNotifier,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 6] = [
        WorkerKind::CompletedMover,
        WorkerKind::FleetNotifier,
        WorkerKind::UnpaidRemover,
        WorkerKind::OilChanges,
        WorkerKind::WelcomeMailer,
        WorkerKind::ConfirmationNotifier,
    ];

    /// Same names as the `[workers.*]` config sections
    pub fn name(&self) -> &'static str {
        match self {
            WorkerKind::CompletedMover => "completed_mover",
            WorkerKind::FleetNotifier => "fleet_notifier",
            WorkerKind::UnpaidRemover => "unpaid_remover",
            WorkerKind::OilChanges => "oil_changes",
            WorkerKind::WelcomeMailer => "welcome_mailer",
            WorkerKind::ConfirmationNotifier => "confirmation_notifier",
        }
    }

    pub fn job_config<'a>(&self, workers: &'a WorkersConfig) -> &'a JobConfig {
        match self {
            WorkerKind::CompletedMover => &workers.completed_mover,
            WorkerKind::FleetNotifier => &workers.fleet_notifier,
            WorkerKind::UnpaidRemover => &workers.unpaid_remover,
            WorkerKind::OilChanges => &workers.oil_changes,
            WorkerKind::WelcomeMailer => &workers.welcome_mailer,
            WorkerKind::ConfirmationNotifier => &workers.confirmation_notifier,
        }
    }

    pub async fn run_once(&self, context: &WorkerContext) -> Result<usize> {
        match self {
            WorkerKind::CompletedMover => completed_mover::run_once(context).await,
            WorkerKind::FleetNotifier => fleet_notifier::run_once(context).await,
            WorkerKind::UnpaidRemover => unpaid_remover::run_once(context).await,
            WorkerKind::OilChanges => oil_changes::run_once(context).await,
            WorkerKind::WelcomeMailer => welcome_mailer::run_once(context).await,
            WorkerKind::ConfirmationNotifier => confirmation_notifier::run_once(context).await,
        }
    }
}

/// Email on the schedule, else the customer's current address
pub(crate) async fn contact_email(
    context: &WorkerContext,
    schedule: &ScheduleRecord,
) -> Result<Option<String>> {
    if let Some(email) = schedule.email.as_deref().filter(|e| !e.trim().is_empty()) {
        return Ok(Some(email.to_string()));
    }
    Ok(context
        .database
        .get_customer_by_id(&schedule.customer_id)
        .await?
        .map(|c| c.email))
}

/// Posts the chat message, emails the contact and sets `flag`. The flag stays
/// unset when the chat message could not be stored, so the next pass retries.
pub(crate) async fn send_notice(
    context: &WorkerContext,
    schedule: &ScheduleRecord,
    notice: &Notice,
    flag: NotificationFlag,
) -> Result<()> {
    context
        .notifier
        .post_office_message(&schedule.customer_id, &notice.chat)
        .await?;

    let to = contact_email(context, schedule).await?;
    deliver_email(context.mailer.as_ref(), to.as_deref(), &notice.email).await;

    context
        .database
        .set_notification_flag(&schedule.id, flag)
        .await?;
    Ok(())
}
