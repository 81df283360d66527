//! Run-state tracking for the scheduled workers
//!
//! Each worker gets one entry. A pass only starts when the previous pass of
//! the same worker has finished, so a slow tick never overlaps the next one.
//! The status API reads the snapshot.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use server::config::JobConfig;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::jobs::WorkerKind;

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub name: &'static str,
    pub schedule: String,
    pub enabled: bool,
    pub running: bool,
    pub runs: u64,
    pub failures: u64,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub last_processed: Option<usize>,
    pub last_error: Option<String>,
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<Vec<JobStatus>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, kind: WorkerKind, job: &JobConfig) {
        let mut jobs = self.jobs.write().await;
        jobs.retain(|j| j.name != kind.name());
        jobs.push(JobStatus {
            name: kind.name(),
            schedule: job.schedule.clone(),
            enabled: job.enabled,
            running: false,
            runs: 0,
            failures: 0,
            last_started_at: None,
            last_finished_at: None,
            last_processed: None,
            last_error: None,
        });
    }

    /// Marks the worker running. False when a pass is already in flight.
    #[instrument(skip(self), fields(worker = %kind.name()))]
    pub async fn try_start(&self, kind: WorkerKind) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.iter_mut().find(|j| j.name == kind.name()) else {
            // Unregistered workers (tests, one-off runs) are never throttled
            return true;
        };

        if job.running {
            debug!("Previous pass still running");
            return false;
        }
        job.running = true;
        job.last_started_at = Some(Utc::now());
        true
    }

    pub async fn finish(&self, kind: WorkerKind, result: &Result<usize>) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.iter_mut().find(|j| j.name == kind.name()) {
            job.running = false;
            job.runs += 1;
            job.last_finished_at = Some(Utc::now());
            match result {
                Ok(processed) => {
                    job.last_processed = Some(*processed);
                    job.last_error = None;
                }
                Err(e) => {
                    job.failures += 1;
                    job.last_processed = None;
                    job.last_error = Some(e.to_string());
                }
            }
        }
    }

    pub async fn snapshot(&self) -> Vec<JobStatus> {
        self.jobs.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn job(schedule: &str) -> JobConfig {
        JobConfig {
            enabled: true,
            schedule: schedule.to_string(),
        }
    }

    #[tokio::test]
    async fn overlapping_pass_is_refused() {
        let registry = JobRegistry::new();
        registry
            .register(WorkerKind::FleetNotifier, &job("*/30 * * * * *"))
            .await;

        assert!(registry.try_start(WorkerKind::FleetNotifier).await);
        assert!(!registry.try_start(WorkerKind::FleetNotifier).await);

        registry.finish(WorkerKind::FleetNotifier, &Ok(2)).await;
        assert!(registry.try_start(WorkerKind::FleetNotifier).await);
    }

    #[tokio::test]
    async fn finish_records_outcome() {
        let registry = JobRegistry::new();
        registry
            .register(WorkerKind::UnpaidRemover, &job("0 * * * * *"))
            .await;

        registry.try_start(WorkerKind::UnpaidRemover).await;
        registry
            .finish(WorkerKind::UnpaidRemover, &Err(anyhow!("database locked")))
            .await;

        let status = &registry.snapshot().await[0];
        assert_eq!(status.name, "unpaid_remover");
        assert_eq!(status.runs, 1);
        assert_eq!(status.failures, 1);
        assert!(!status.running);
        assert_eq!(status.last_error.as_deref(), Some("database locked"));
    }

    #[tokio::test]
    async fn unregistered_worker_always_starts() {
        let registry = JobRegistry::new();
        assert!(registry.try_start(WorkerKind::OilChanges).await);
        assert!(registry.try_start(WorkerKind::OilChanges).await);
    }
}
