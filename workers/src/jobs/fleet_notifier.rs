use anyhow::Result;
use server::database::{AccountType, NotificationFlag, ScheduleRecord};
use server::lifecycle;
use server::messages::{self, Notice};
use tracing::{debug, info, warn};

use super::send_notice;
use crate::context::WorkerContext;

struct Pass {
    label: &'static str,
    needs_notice: fn(&ScheduleRecord) -> bool,
    notice: fn(&ScheduleRecord) -> Notice,
    flag: NotificationFlag,
}

const PASSES: [Pass; 3] = [
    Pass {
        label: "pending approval",
        needs_notice: lifecycle::needs_pending_notice,
        notice: messages::fleet_pending,
        flag: NotificationFlag::FleetNotified,
    },
    Pass {
        label: "processed",
        needs_notice: lifecycle::needs_processed_notice,
        notice: messages::fleet_processed,
        flag: NotificationFlag::FleetProcessedNotified,
    },
    Pass {
        label: "invoice",
        needs_notice: lifecycle::needs_invoice_notice,
        notice: messages::fleet_invoice,
        flag: NotificationFlag::InvoiceSentNotified,
    },
];

/// Pending, processed and invoice notices for fleet schedules, in that order
pub async fn run_once(context: &WorkerContext) -> Result<usize> {
    let schedules = context
        .database
        .list_schedules_by_account_type(AccountType::Fleet)
        .await?;

    let mut sent = 0;
    for pass in &PASSES {
        for schedule in schedules.iter().filter(|s| (pass.needs_notice)(s)) {
            let notice = (pass.notice)(schedule);
            match send_notice(context, schedule, &notice, pass.flag).await {
                Ok(()) => {
                    sent += 1;
                    info!("Sent fleet {} notice for schedule {}", pass.label, schedule.id);
                }
                Err(e) => warn!(
                    "Fleet {} notice for schedule {} failed, retrying next pass: {}",
                    pass.label, schedule.id, e
                ),
            }
        }
    }

    if sent == 0 {
        debug!("No fleet notices due");
    }
    Ok(sent)
}
