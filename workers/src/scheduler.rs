//! Cron-based scheduling for the background workers
//!
//! Schedules use 6-field cron expressions (sec min hour day month dow) and
//! run in the business time zone. Every enabled worker also runs one pass as
//! soon as it is registered.
//!
//! ```toml
//! [workers.unpaid_remover]
//! enabled = true
//! schedule = "0 * * * * *"  # Every minute
//! ```

use anyhow::{anyhow, Result};
use server::config::validate_6_field_cron;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};

use crate::context::WorkerContext;
use crate::jobs::WorkerKind;
use crate::registry::JobRegistry;

pub struct WorkerScheduler {
    context: WorkerContext,
    registry: JobRegistry,
    scheduler: JobScheduler,
    started: bool,
}

impl WorkerScheduler {
    pub async fn new(context: WorkerContext, registry: JobRegistry) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            context,
            registry,
            scheduler,
            started: false,
        })
    }

    /// Registers every enabled worker and starts the scheduler. Returns the
    /// number of scheduled jobs.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<usize> {
        info!("Starting worker scheduler with 6-field cron format (sec min hour day month dow)");
        let mut scheduled_count = 0;

        for kind in WorkerKind::ALL {
            let job = kind.job_config(&self.context.config.workers);
            self.registry.register(kind, job).await;

            if !job.enabled {
                info!("Worker {} disabled, skipping schedule", kind.name());
                continue;
            }

            match self.schedule_job(kind, job.schedule.clone()).await {
                Ok(()) => {
                    scheduled_count += 1;
                    info!("✓ Scheduled {}: {}", kind.name(), job.schedule);
                }
                Err(e) => {
                    error!(
                        "✗ Failed to schedule {}: {} (schedule: {})",
                        kind.name(),
                        e,
                        job.schedule
                    );
                }
            }
        }

        if scheduled_count > 0 {
            self.scheduler
                .start()
                .await
                .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;
            self.started = true;
            info!(
                "✓ Worker scheduler started successfully with {} jobs",
                scheduled_count
            );
        } else {
            warn!("No workers enabled - scheduler not started");
        }

        Ok(scheduled_count)
    }

    async fn schedule_job(&self, kind: WorkerKind, schedule: String) -> Result<()> {
        validate_6_field_cron(&schedule)
            .map_err(|e| anyhow!("Invalid 6-field cron schedule '{}': {}", schedule, e))?;

        let context = self.context.clone();
        let registry = self.registry.clone();

        let job = Job::new_async_tz(
            schedule.as_str(),
            self.context.timezone,
            move |_uuid, _scheduler| {
                let context = context.clone();
                let registry = registry.clone();
                Box::pin(async move {
                    run_pass(kind, &context, &registry).await;
                })
            },
        )
        .map_err(|e| anyhow!("Failed to create {} job for '{}': {}", kind.name(), schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add {} job to scheduler: {}", kind.name(), e))?;

        let context = self.context.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            run_pass(kind, &context, &registry).await;
        });

        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to stop scheduler: {}", e))
    }
}

/// Runs one pass unless the previous pass of the same worker is still busy.
/// Errors are logged and recorded; the next tick runs regardless.
pub async fn run_pass(
    kind: WorkerKind,
    context: &WorkerContext,
    registry: &JobRegistry,
) -> Option<usize> {
    if !registry.try_start(kind).await {
        debug!("Skipping {} tick, previous pass still running", kind.name());
        return None;
    }

    let result = kind.run_once(context).await;
    match &result {
        Ok(0) => debug!("{} pass finished, nothing to do", kind.name()),
        Ok(processed) => info!("{} pass processed {} record(s)", kind.name(), processed),
        Err(e) => error!("{} pass failed: {}", kind.name(), e),
    }

    registry.finish(kind, &result).await;
    result.ok()
}
