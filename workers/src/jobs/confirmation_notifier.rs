use anyhow::Result;
use server::database::{AccountType, NotificationFlag};
use server::lifecycle;
use server::messages;
use tracing::{debug, info, warn};

use super::send_notice;
use crate::context::WorkerContext;

/// Payment confirmation for paid customer schedules not yet notified
pub async fn run_once(context: &WorkerContext) -> Result<usize> {
    let schedules = context
        .database
        .list_schedules_by_account_type(AccountType::Customer)
        .await?;

    let mut sent = 0;
    for schedule in schedules
        .iter()
        .filter(|s| lifecycle::needs_confirmation_notice(s))
    {
        let notice = messages::payment_confirmation(schedule);
        match send_notice(
            context,
            schedule,
            &notice,
            NotificationFlag::ConfirmationNotified,
        )
        .await
        {
            Ok(()) => {
                sent += 1;
                info!("Payment confirmation sent for schedule {}", schedule.id);
            }
            Err(e) => warn!(
                "Payment confirmation for schedule {} failed, retrying next pass: {}",
                schedule.id, e
            ),
        }
    }

    if sent == 0 {
        debug!("No payment confirmations due");
    }
    Ok(sent)
}
