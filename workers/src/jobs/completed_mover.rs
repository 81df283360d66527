use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info};

use crate::context::WorkerContext;
use crate::history::MovedSchedule;

/// Moves completed schedules into the archive and records each move
pub async fn run_once(context: &WorkerContext) -> Result<usize> {
    let completed = context.database.list_completed_schedules().await?;
    if completed.is_empty() {
        debug!("No completed schedules to move");
        return Ok(0);
    }

    let mut moved = 0;
    for schedule in &completed {
        let moved_at = Utc::now();
        match context.database.move_to_completed(schedule, moved_at).await {
            Ok(true) => {
                context
                    .history
                    .record(MovedSchedule::from_schedule(schedule, moved_at))
                    .await;
                moved += 1;
                info!(
                    "Moved schedule {} (service milage: {:?})",
                    schedule.id, schedule.service_milage
                );
            }
            Ok(false) => debug!("Schedule {} already archived", schedule.id),
            Err(e) => error!("Failed to move schedule {}: {}", schedule.id, e),
        }
    }

    Ok(moved)
}
