use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::platform::Workspace;
use crate::reminders::{run_once, ReminderSettings, RunSummary};

/// Runs the reminder sweep on a cron schedule.
///
/// A tick that arrives while the previous sweep is still sending is dropped,
/// so deliveries never interleave and the send delay stays global.
pub struct ReminderScheduler {
    jobs: JobScheduler,
    running: Arc<Mutex<()>>,
}

impl ReminderScheduler {
    pub async fn new() -> Result<Self> {
        let jobs = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self {
            jobs,
            running: Arc::new(Mutex::new(())),
        })
    }

    /// Register the sweep. A bad cron expression is reported here, before
    /// anything starts.
    pub async fn schedule_sweep(
        &self,
        cron_expr: &str,
        workspace: Arc<dyn Workspace>,
        settings: Arc<ReminderSettings>,
    ) -> Result<()> {
        let running = Arc::clone(&self.running);
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let workspace = Arc::clone(&workspace);
            let settings = Arc::clone(&settings);
            let running = Arc::clone(&running);
            Box::pin(async move {
                guarded_sweep(workspace.as_ref(), &settings, &running).await;
            })
        })
        .with_context(|| format!("Invalid cron expression for reminder sweep: {}", cron_expr))?;

        self.jobs
            .add(job)
            .await
            .context("Failed to add reminder sweep job")?;

        info!("Reminder sweep scheduled with cron: {}", cron_expr);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.jobs
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.jobs
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

/// One scheduled tick. Returns `None` when a sweep is already in flight.
async fn guarded_sweep(
    workspace: &dyn Workspace,
    settings: &ReminderSettings,
    running: &Mutex<()>,
) -> Option<RunSummary> {
    let Ok(_guard) = running.try_lock() else {
        warn!("Previous reminder sweep still running, skipping this tick");
        return None;
    };
    Some(run_once(workspace, settings).await)
}
