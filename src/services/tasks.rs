//! Units of background work
//!
//! Every job is independent and only shares the store with the others.
//! Failures inside a fan-out are logged per project and never abort the
//! remaining projects.

use crate::config::{ControllerConfig, SchedulerConfig};
use crate::core::detector::SpikeDetector;
use crate::core::events::EventTransitionEngine;
use crate::core::models::{AppReference, Event};
use crate::core::sampling::SampleRateController;
use crate::core::upstream::PaginatedClient;
use crate::monitoring::ControllerMetrics;
use crate::storage::Store;
use crate::utils::error::{ControllerError, Result};
use chrono::{DateTime, Duration, Utc};
use futures::{StreamExt, stream};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Scheduled jobs, runnable one-off from the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Job {
    PopulateApp,
    CloseWindow,
    PruneInactiveApp,
    PruneOldEvent,
    PullProjectSlug,
    MonitorUsage,
}

impl Job {
    pub const ALL: [Job; 6] = [
        Job::PopulateApp,
        Job::CloseWindow,
        Job::PruneInactiveApp,
        Job::PruneOldEvent,
        Job::PullProjectSlug,
        Job::MonitorUsage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Job::PopulateApp => "populate_app",
            Job::CloseWindow => "close_window",
            Job::PruneInactiveApp => "prune_inactive_app",
            Job::PruneOldEvent => "prune_old_event",
            Job::PullProjectSlug => "pull_project_slug",
            Job::MonitorUsage => "monitor_usage",
        }
    }

    pub fn period(&self, config: &SchedulerConfig) -> std::time::Duration {
        let secs = match self {
            Job::PopulateApp => config.populate_app,
            Job::CloseWindow => config.close_window,
            Job::PruneInactiveApp => config.prune_inactive_app,
            Job::PruneOldEvent => config.prune_old_event,
            Job::PullProjectSlug => config.pull_project_slug,
            Job::MonitorUsage => config.monitor_usage,
        };
        std::time::Duration::from_secs(secs)
    }
}

/// Outcome of a detection fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    pub projects: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub events: usize,
}

/// Everything a job needs, cloned into each task
#[derive(Clone)]
pub struct JobContext {
    store: Arc<dyn Store>,
    client: PaginatedClient,
    rates: SampleRateController,
    events: EventTransitionEngine,
    config: ControllerConfig,
    metrics: Arc<ControllerMetrics>,
}

impl JobContext {
    pub fn new(
        store: Arc<dyn Store>,
        client: PaginatedClient,
        rates: SampleRateController,
        config: ControllerConfig,
        metrics: Arc<ControllerMetrics>,
    ) -> Self {
        Self {
            events: EventTransitionEngine::new(store.clone()),
            store,
            client,
            rates,
            config,
            metrics,
        }
    }

    pub fn scheduler_config(&self) -> &SchedulerConfig {
        &self.config.scheduler
    }

    /// Run one job to completion
    pub async fn run(&self, job: Job) -> Result<()> {
        let now = Utc::now();
        match job {
            Job::PopulateApp => {
                self.populate_app().await?;
            }
            Job::CloseWindow => {
                self.close_window(now).await?;
            }
            Job::PruneInactiveApp => {
                self.prune_inactive_app(now).await?;
            }
            Job::PruneOldEvent => {
                self.prune_old_event(now).await?;
            }
            Job::PullProjectSlug => {
                self.pull_project_slug().await?;
            }
            Job::MonitorUsage => {
                self.monitor_usage().await?;
            }
        }
        Ok(())
    }

    /// Link unlinked applications to their project
    ///
    /// Only references of the form `projectId_env_command` are linked; the
    /// project is created with the default detection parameters if needed.
    pub async fn populate_app(&self) -> Result<u64> {
        let mut linked = 0;
        for reference in self.store.apps_without_project().await? {
            let Some(parts) = AppReference::parse(&reference) else {
                debug!("App {} does not encode a project", reference);
                continue;
            };

            self.store
                .get_or_create_project(&parts.project_id, &self.config.detection)
                .await?;
            self.store
                .link_app(&reference, &parts.project_id, &parts.env, &parts.command)
                .await?;
            linked += 1;
        }

        if linked > 0 {
            info!("Linked {} app(s) to their project", linked);
        }
        Ok(linked)
    }

    /// Delete applications not seen within the retention, then empty projects
    pub async fn prune_inactive_app(&self, now: DateTime<Utc>) -> Result<(u64, u64)> {
        let cutoff = retention_cutoff(now, self.config.retention.app_max_age_days)?;

        let apps = self.store.delete_apps_inactive_since(cutoff).await?;
        if apps > 0 {
            info!("Pruned {} app(s)", apps);
        }

        let projects = self.store.delete_projects_without_apps().await?;
        if projects > 0 {
            info!("Pruned {} project(s)", projects);
        }
        Ok((apps, projects))
    }

    /// Delete events older than the retention
    pub async fn prune_old_event(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = retention_cutoff(now, self.config.retention.event_max_age_days)?;
        let events = self.store.delete_events_before(cutoff).await?;
        if events > 0 {
            info!("Pruned {} event(s)", events);
        }
        Ok(events)
    }

    /// Return lapsed bump windows to the default rate
    pub async fn close_window(&self, now: DateTime<Utc>) -> Result<u64> {
        self.rates.close_expired_windows(now).await
    }

    /// Fill in slugs of projects that lack one
    ///
    /// Stops paging as soon as every pending project has been found.
    pub async fn pull_project_slug(&self) -> Result<u64> {
        let mut pending: HashSet<String> =
            self.store.projects_without_slug().await?.into_iter().collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let mut slugs = Vec::new();
        let mut pages = self.client.list_projects();
        while let Some(page) = pages.next().await {
            for project in PaginatedClient::project_page(page?)? {
                if pending.remove(&project.id) {
                    slugs.push((project.id, project.slug));
                }
            }
            if pending.is_empty() {
                break;
            }
        }

        let updated = self.store.update_project_slugs(&slugs).await?;
        info!("Updated {} project slug(s)", updated);
        Ok(updated)
    }

    /// Run detection for every project, a bounded number at a time
    pub async fn monitor_usage(&self) -> Result<DetectionSummary> {
        let ids = self.store.list_project_ids().await?;
        let concurrency = self.config.scheduler.detect_concurrency.max(1);

        let results: Vec<(String, Result<Vec<Event>>)> = stream::iter(ids)
            .map(|id| {
                let ctx = self.clone();
                async move {
                    let result = ctx.perform_detect(&id).await;
                    (id, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut summary = DetectionSummary {
            projects: results.len(),
            ..Default::default()
        };
        for (id, result) in results {
            match result {
                Ok(events) => {
                    summary.succeeded += 1;
                    summary.events += events.len();
                }
                Err(e) if e.is_detection_failure() => {
                    summary.failed += 1;
                    warn!(project = %id, "Detection skipped: {}", e);
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(project = %id, "Detection failed: {}", e);
                }
            }
        }

        info!(
            "Detection finished for {} project(s): {} ok, {} failed, {} new event(s)",
            summary.projects, summary.succeeded, summary.failed, summary.events
        );
        Ok(summary)
    }

    /// Fetch stats, detect and record events for one project
    pub async fn perform_detect(&self, project_id: &str) -> Result<Vec<Event>> {
        let result = self.detect(project_id).await;
        match &result {
            Ok(events) => self.metrics.record_detection(true, events.len() as u64),
            Err(_) => self.metrics.record_detection(false, 0),
        }
        result
    }

    async fn detect(&self, project_id: &str) -> Result<Vec<Event>> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| ControllerError::not_found(format!("project {}", project_id)))?;

        let stats = self.client.fetch_stats(&project.id).await?;
        let query = self.client.stats_query();
        let (signal, dump) = SpikeDetector::from_project(&project).compute_stats(
            &stats,
            &query.field,
            &query.outcome,
        )?;

        let events = self.events.apply(&project, &signal, &dump).await?;
        debug!(project = %project, "{} new event(s)", events.len());
        Ok(events)
    }
}

/// Start of the retention window ending at `now`
fn retention_cutoff(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| ControllerError::config(format!("retention of {} days is out of range", days)))
}
