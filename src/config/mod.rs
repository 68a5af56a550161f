//! Configuration management for the controller
//!
//! This module handles loading, environment overrides and validation of the
//! controller configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{ControllerError, Result};
use std::env;
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the controller
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Controller configuration
    pub controller: ControllerConfig,
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ControllerError::Config(format!("Failed to read config file: {}", e)))?;

        let controller: ControllerConfig = serde_yaml::from_str(&content)
            .map_err(|e| ControllerError::Config(format!("Failed to parse config: {}", e)))?;

        let mut config = Self { controller };
        config.apply_env()?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        let c = &mut self.controller;

        if let Ok(host) = env::var("HTTP_ADDR") {
            c.server.host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            c.server.port = parse_env("HTTP_PORT", &port)?;
        }
        if let Ok(workers) = env::var("WORKERS") {
            c.server.workers = Some(parse_env("WORKERS", &workers)?);
        }

        if let Ok(url) = env::var("DATABASE_URL") {
            c.storage.database.url = url;
            c.storage.database.enabled = true;
        }
        if let Ok(url) = env::var("REDIS_URL") {
            c.storage.redis.url = url;
            c.storage.redis.enabled = true;
        }

        if let Ok(token) = env::var("SENTRY_API_TOKEN") {
            c.upstream.token = token;
        }
        if let Ok(slug) = env::var("SENTRY_ORGANIZATION_SLUG") {
            c.upstream.organization_slug = slug;
        }

        if let Ok(rate) = env::var("DEFAULT_SAMPLE_RATE") {
            c.sampling.default_sample_rate = parse_env("DEFAULT_SAMPLE_RATE", &rate)?;
        }
        if let Ok(secs) = env::var("MAX_BUMP_TIME_SEC") {
            let secs: u64 = parse_env("MAX_BUMP_TIME_SEC", &secs)?;
            // Zero means "unset" in deployment manifests
            c.sampling.max_bump_secs = if secs == 0 {
                models::sampling::default_max_bump_secs()
            } else {
                secs
            };
        }
        if let Ok(paths) = env::var("DEFAULT_WSGI_IGNORE_PATHS") {
            c.sampling.default_wsgi_ignore_paths = split_list(&paths);
        }
        if let Ok(tasks) = env::var("DEFAULT_CELERY_IGNORE_TASKS") {
            c.sampling.default_celery_ignore_tasks = split_list(&tasks);
        }

        if let Ok(days) = env::var("APP_AUTO_PRUNE_MAX_AGE_DAY") {
            c.retention.app_max_age_days = parse_env("APP_AUTO_PRUNE_MAX_AGE_DAY", &days)?;
        }
        if let Ok(days) = env::var("EVENT_AUTO_PRUNE_MAX_AGE_DAY") {
            c.retention.event_max_age_days = parse_env("EVENT_AUTO_PRUNE_MAX_AGE_DAY", &days)?;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            c.logging.level = level;
        }

        Ok(())
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.controller.server
    }

    /// Get storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.controller.storage
    }

    /// Get upstream API configuration
    pub fn upstream(&self) -> &UpstreamConfig {
        &self.controller.upstream
    }

    /// Get sampling configuration
    pub fn sampling(&self) -> &SamplingConfig {
        &self.controller.sampling
    }

    /// Get default detection parameters
    pub fn detection(&self) -> &DetectionParams {
        &self.controller.detection
    }

    /// Get retention configuration
    pub fn retention(&self) -> &RetentionConfig {
        &self.controller.retention
    }

    /// Get scheduler configuration
    pub fn scheduler(&self) -> &SchedulerConfig {
        &self.controller.scheduler
    }

    /// Get logging configuration
    pub fn logging(&self) -> &LoggingConfig {
        &self.controller.logging
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        self.controller.validate().map_err(ControllerError::Config)
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.controller).map_err(|e| {
            ControllerError::Config(format!("Failed to serialize config to YAML: {}", e))
        })
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ControllerError::Config(format!("Invalid {}: {}", name, e)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
