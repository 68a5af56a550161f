//! Sample rate configuration

use serde::{Deserialize, Serialize};

/// Defaults applied to new applications and bounds on operator bumps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Rate assigned to new applications
    #[serde(default = "default_sample_rate")]
    pub default_sample_rate: f64,
    /// Longest bump window an operator may open, in seconds
    #[serde(default = "default_max_bump_secs")]
    pub max_bump_secs: u64,
    /// Request paths excluded from WSGI metrics on new applications
    #[serde(default = "default_wsgi_ignore_paths")]
    pub default_wsgi_ignore_paths: Vec<String>,
    /// Tasks excluded from Celery metrics on new applications
    #[serde(default)]
    pub default_celery_ignore_tasks: Vec<String>,
    /// Key of the global panic flag in the key-value store
    #[serde(default = "default_panic_key")]
    pub panic_key: String,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            default_sample_rate: default_sample_rate(),
            max_bump_secs: default_max_bump_secs(),
            default_wsgi_ignore_paths: default_wsgi_ignore_paths(),
            default_celery_ignore_tasks: Vec::new(),
            panic_key: default_panic_key(),
        }
    }
}

impl SamplingConfig {
    /// Longest allowed bump as a chrono duration
    pub fn max_bump(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_bump_secs as i64)
    }
}

fn default_sample_rate() -> f64 {
    0.1
}

pub(crate) fn default_max_bump_secs() -> u64 {
    30 * 60
}

pub(crate) fn default_wsgi_ignore_paths() -> Vec<String> {
    ["/health", "/healthz", "/health/", "/healthz/"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_panic_key() -> String {
    "PANIC".to_string()
}
