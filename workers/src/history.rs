//! In-memory history of schedules moved to the completed archive, newest first

use chrono::{DateTime, Utc};
use serde::Serialize;
use server::constants::workers::MOVED_HISTORY_LIMIT;
use server::database::ScheduleRecord;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovedSchedule {
    pub id: String,
    pub customer_name: String,
    pub email: Option<String>,
    pub completed_by: Option<String>,
    pub date: String,
    pub time: String,
    pub service_milage: Option<i64>,
    pub moved_at: DateTime<Utc>,
}

impl MovedSchedule {
    pub fn from_schedule(schedule: &ScheduleRecord, moved_at: DateTime<Utc>) -> Self {
        Self {
            id: schedule.id.clone(),
            customer_name: schedule.customer_name.clone(),
            email: schedule.email.clone(),
            completed_by: schedule.completed_by.clone(),
            date: schedule.date.clone(),
            time: schedule.time.clone(),
            service_milage: schedule.service_milage,
            moved_at,
        }
    }
}

#[derive(Clone)]
pub struct MovedHistory {
    entries: Arc<RwLock<VecDeque<MovedSchedule>>>,
    limit: usize,
}

impl Default for MovedHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MovedHistory {
    pub fn new() -> Self {
        Self::with_limit(MOVED_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(limit))),
            limit,
        }
    }

    pub async fn record(&self, entry: MovedSchedule) {
        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        entries.truncate(self.limit);
    }

    pub async fn entries(&self) -> Vec<MovedSchedule> {
        self.entries.read().await.iter().cloned().collect()
    }
}
