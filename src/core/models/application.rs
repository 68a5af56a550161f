use crate::config::SamplingConfig;
use crate::core::metrics::{Counters, MetricFamily};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection settings and running counters of one metric family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSettings {
    /// Whether the client should collect this family
    pub collect: bool,
    /// Running totals, possibly still in the legacy flat shape
    pub counters: Option<Counters>,
    /// Paths or tasks the client should not report
    pub ignore: Vec<String>,
}

/// Values given to applications on creation
#[derive(Debug, Clone, PartialEq)]
pub struct AppDefaults {
    pub sample_rate: f64,
    pub wsgi_ignore_paths: Vec<String>,
    pub celery_ignore_tasks: Vec<String>,
}

impl From<&SamplingConfig> for AppDefaults {
    fn from(config: &SamplingConfig) -> Self {
        Self {
            sample_rate: config.default_sample_rate,
            wsgi_ignore_paths: config.default_wsgi_ignore_paths.clone(),
            celery_ignore_tasks: config.default_celery_ignore_tasks.clone(),
        }
    }
}

impl Default for AppDefaults {
    fn default() -> Self {
        Self::from(&SamplingConfig::default())
    }
}

/// A monitored service instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Primary key, `projectId_env_command` for linkable apps
    pub reference: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub default_sample_rate: f64,
    pub active_sample_rate: f64,
    pub active_window_end: Option<DateTime<Utc>>,
    pub project_id: Option<String>,
    pub env: Option<String>,
    pub command: Option<String>,
    pub wsgi: MetricSettings,
    pub celery: MetricSettings,
}

/// Parts of an application reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppReference {
    pub project_id: String,
    pub env: String,
    pub command: String,
}

impl AppReference {
    /// Split `projectId_env_command`; anything but three parts is unlinkable
    pub fn parse(reference: &str) -> Option<Self> {
        let parts: Vec<&str> = reference.split('_').collect();
        match parts.as_slice() {
            [project_id, env, command] => Some(Self {
                project_id: project_id.to_string(),
                env: env.to_string(),
                command: command.to_string(),
            }),
            _ => None,
        }
    }
}

impl Application {
    pub fn new(reference: impl Into<String>, defaults: &AppDefaults) -> Self {
        Self {
            reference: reference.into(),
            last_seen: None,
            default_sample_rate: defaults.sample_rate,
            active_sample_rate: defaults.sample_rate,
            active_window_end: None,
            project_id: None,
            env: None,
            command: None,
            wsgi: MetricSettings {
                ignore: defaults.wsgi_ignore_paths.clone(),
                ..Default::default()
            },
            celery: MetricSettings {
                ignore: defaults.celery_ignore_tasks.clone(),
                ..Default::default()
            },
        }
    }

    pub fn metric(&self, family: MetricFamily) -> &MetricSettings {
        match family {
            MetricFamily::Wsgi => &self.wsgi,
            MetricFamily::Celery => &self.celery,
        }
    }

    pub fn metric_mut(&mut self, family: MetricFamily) -> &mut MetricSettings {
        match family {
            MetricFamily::Wsgi => &mut self.wsgi,
            MetricFamily::Celery => &mut self.celery,
        }
    }
}
