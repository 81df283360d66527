use anyhow::Result;
use chrono::{Duration, Utc};
use server::database::{AccountType, ScheduleRecord};
use server::lifecycle;
use server::messages;
use server::services::deliver_email;
use tracing::{debug, info, warn};

use super::contact_email;
use crate::context::WorkerContext;

/// Cancels customer schedules left unpaid past the grace period: chat message,
/// cancellation email, then removal of exactly the schedules that were notified.
pub async fn run_once(context: &WorkerContext) -> Result<usize> {
    let grace = Duration::minutes(context.config.unpaid_grace_minutes);
    let now = Utc::now();

    let expired: Vec<ScheduleRecord> = context
        .database
        .list_schedules_by_account_type(AccountType::Customer)
        .await?
        .into_iter()
        .filter(|s| lifecycle::is_unpaid_expired(s, now, grace))
        .collect();

    if expired.is_empty() {
        debug!("No expired unpaid schedules");
        return Ok(0);
    }

    let mut notified = Vec::with_capacity(expired.len());
    for listed in &expired {
        // A capture may land while earlier schedules are being notified
        let schedule = match context.database.get_schedule(&listed.id).await {
            Ok(Some(current)) if lifecycle::is_unpaid_expired(&current, now, grace) => current,
            Ok(_) => {
                debug!("Schedule {} was paid or removed, skipping", listed.id);
                continue;
            }
            Err(e) => {
                warn!("Could not re-read schedule {}: {}", listed.id, e);
                continue;
            }
        };
        let notice = messages::unpaid_cancellation(&schedule);

        if let Err(e) = context
            .notifier
            .post_office_message(&schedule.customer_id, &notice.chat)
            .await
        {
            warn!(
                "Could not post unpaid cancellation for schedule {}: {}",
                schedule.id, e
            );
        }

        match contact_email(context, &schedule).await {
            Ok(to) => {
                deliver_email(context.mailer.as_ref(), to.as_deref(), &notice.email).await;
            }
            Err(e) => warn!("Could not look up contact for schedule {}: {}", schedule.id, e),
        }
        notified.push(schedule.id);
    }

    let removed = context
        .database
        .delete_unpaid_customer_schedules(&notified)
        .await?;
    if (removed as usize) < notified.len() {
        warn!(
            "{} notified schedule(s) were paid before removal and were kept",
            notified.len() - removed as usize
        );
    }
    info!(
        "Removed {} unpaid schedule(s) older than {} minutes",
        removed, context.config.unpaid_grace_minutes
    );
    Ok(removed as usize)
}
