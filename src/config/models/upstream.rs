//! External analytics API configuration

use serde::{Deserialize, Serialize};

/// Connection settings for the analytics API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API root, joined with resource paths
    #[serde(default = "default_upstream_host")]
    pub host: String,
    /// Bearer token sent on every request
    #[serde(default)]
    pub token: String,
    /// Organization owning the monitored projects
    #[serde(default)]
    pub organization_slug: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout: u64,
    /// Header carrying the rate-limit window end (epoch seconds)
    #[serde(default = "default_rate_limit_reset_header")]
    pub rate_limit_reset_header: String,
    /// Usage stats query
    #[serde(default)]
    pub stats: StatsQueryConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: default_upstream_host(),
            token: String::new(),
            organization_slug: String::new(),
            timeout: default_upstream_timeout(),
            rate_limit_reset_header: default_rate_limit_reset_header(),
            stats: StatsQueryConfig::default(),
        }
    }
}

/// Parameters of the usage stats query sent for every project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsQueryConfig {
    pub field: String,
    pub group_by: Vec<String>,
    pub interval: String,
    pub stats_period: String,
    pub category: String,
    /// Outcome group the detector runs on
    pub outcome: String,
}

impl Default for StatsQueryConfig {
    fn default() -> Self {
        Self {
            field: "sum(quantity)".to_string(),
            group_by: vec!["category".to_string(), "outcome".to_string()],
            interval: "1h".to_string(),
            stats_period: "7d".to_string(),
            category: "transaction".to_string(),
            outcome: "accepted".to_string(),
        }
    }
}

fn default_upstream_host() -> String {
    "https://sentry.io/api/0/".to_string()
}

fn default_upstream_timeout() -> u64 {
    20
}

fn default_rate_limit_reset_header() -> String {
    "x-sentry-rate-limit-reset".to_string()
}
