//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Periods of the scheduled jobs, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the scheduler alongside the HTTP server
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_minute")]
    pub populate_app: u64,
    #[serde(default = "default_minute")]
    pub close_window: u64,
    #[serde(default = "default_hour")]
    pub prune_inactive_app: u64,
    #[serde(default = "default_hour")]
    pub prune_old_event: u64,
    #[serde(default = "default_ten_minutes")]
    pub pull_project_slug: u64,
    #[serde(default = "default_hour")]
    pub monitor_usage: u64,
    /// Maximum detection runs in flight during a fan-out
    #[serde(default = "default_detect_concurrency")]
    pub detect_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            populate_app: default_minute(),
            close_window: default_minute(),
            prune_inactive_app: default_hour(),
            prune_old_event: default_hour(),
            pull_project_slug: default_ten_minutes(),
            monitor_usage: default_hour(),
            detect_concurrency: default_detect_concurrency(),
        }
    }
}

impl SchedulerConfig {
    /// All job periods, keyed by job name
    pub fn periods(&self) -> [(&'static str, Duration); 6] {
        [
            ("populate_app", Duration::from_secs(self.populate_app)),
            ("close_window", Duration::from_secs(self.close_window)),
            (
                "prune_inactive_app",
                Duration::from_secs(self.prune_inactive_app),
            ),
            ("prune_old_event", Duration::from_secs(self.prune_old_event)),
            (
                "pull_project_slug",
                Duration::from_secs(self.pull_project_slug),
            ),
            ("monitor_usage", Duration::from_secs(self.monitor_usage)),
        ]
    }
}

fn default_true() -> bool {
    true
}

fn default_minute() -> u64 {
    60
}

fn default_ten_minutes() -> u64 {
    600
}

fn default_hour() -> u64 {
    3600
}

fn default_detect_concurrency() -> usize {
    8
}
