use anyhow::Result;
use chrono::Utc;
use server::database::{OilChangeRecord, ScheduleRecord};
use tracing::{debug, error, info};

use crate::context::WorkerContext;

fn oil_change_entry(schedule: &ScheduleRecord) -> OilChangeRecord {
    OilChangeRecord {
        customer_id: schedule.customer_id.clone(),
        schedule_id: schedule.id.clone(),
        date: schedule.date.clone(),
        time: schedule.time.clone(),
        total: schedule.total,
        offer_price: schedule.offer_price.clone(),
        client_address: schedule.client_address.clone(),
        completed_at: schedule.completed_at,
        completed_by: schedule.completed_by.clone(),
        service_milage: schedule.service_milage,
        vehicle: schedule.vehicles.first().cloned(),
        recorded_at: Utc::now(),
    }
}

/// Adds an oil-change history entry for every archived schedule whose
/// customer still exists and has no entry for it yet
pub async fn run_once(context: &WorkerContext) -> Result<usize> {
    let archived = context.database.list_archived_schedules().await?;

    let mut recorded = 0;
    for entry in &archived {
        let schedule = &entry.schedule;
        if !schedule.completed {
            continue;
        }

        match record(context, schedule).await {
            Ok(true) => {
                recorded += 1;
                info!(
                    "Oil change recorded for customer {} (schedule {})",
                    schedule.customer_id, schedule.id
                );
            }
            Ok(false) => {}
            Err(e) => error!("Oil change for schedule {} failed: {}", schedule.id, e),
        }
    }

    if recorded == 0 {
        debug!("No new oil changes");
    }
    Ok(recorded)
}

async fn record(context: &WorkerContext, schedule: &ScheduleRecord) -> Result<bool> {
    if context
        .database
        .get_customer_by_id(&schedule.customer_id)
        .await?
        .is_none()
    {
        return Ok(false);
    }
    if context
        .database
        .has_oil_change(&schedule.customer_id, &schedule.id)
        .await?
    {
        return Ok(false);
    }
    context
        .database
        .insert_oil_change(&oil_change_entry(schedule))
        .await
}
