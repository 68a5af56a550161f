//! Retention configuration

use serde::{Deserialize, Serialize};

/// Upper bound on either retention period (about a century)
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Age limits enforced by the pruning jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Applications not seen for this many days are deleted
    #[serde(default = "default_app_max_age_days")]
    pub app_max_age_days: i64,
    /// Events older than this many days are deleted
    #[serde(default = "default_event_max_age_days")]
    pub event_max_age_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            app_max_age_days: default_app_max_age_days(),
            event_max_age_days: default_event_max_age_days(),
        }
    }
}

fn default_app_max_age_days() -> i64 {
    7
}

fn default_event_max_age_days() -> i64 {
    30
}
