//! Periodic job runner

use super::tasks::{Job, JobContext};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Runs every job on its own interval until shutdown
pub struct Scheduler {
    ctx: JobContext,
}

impl Scheduler {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    /// Spawn one loop per job
    ///
    /// Loops exit when `shutdown` flips to `true` or its sender is dropped.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        info!("Starting scheduler with {} job(s)", Job::ALL.len());

        Job::ALL
            .into_iter()
            .map(|job| {
                let period = job.period(self.ctx.scheduler_config());
                tokio::spawn(run_periodically(
                    self.ctx.clone(),
                    job,
                    period,
                    shutdown.clone(),
                ))
            })
            .collect()
    }
}

async fn run_periodically(
    ctx: JobContext,
    job: Job,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                debug!("Running job {}", job.name());
                if let Err(e) = ctx.run(job).await {
                    warn!("Job {} failed: {}", job.name(), e);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("Stopping job {}", job.name());
                    break;
                }
            }
        }
    }
}
