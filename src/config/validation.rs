//! Configuration validation
//!
//! Each configuration section validates itself; the root walks every section.

use crate::config::models::*;
use tracing::debug;

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for ControllerConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating controller configuration");

        self.server.validate()?;
        self.upstream.validate()?;
        self.sampling.validate()?;
        self.detection.validate()?;
        self.retention.validate()?;
        self.scheduler.validate()?;

        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Server host cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if let Some(0) = self.workers {
            return Err("Worker count must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for UpstreamConfig {
    fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.host).map_err(|e| format!("Invalid upstream host: {}", e))?;
        if self.timeout == 0 {
            return Err("Upstream timeout must be greater than 0".to_string());
        }
        if self.rate_limit_reset_header.is_empty() {
            return Err("Rate limit reset header cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for SamplingConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.default_sample_rate) {
            return Err(format!(
                "default_sample_rate must be between 0 and 1, got {}",
                self.default_sample_rate
            ));
        }
        if self.max_bump_secs == 0 {
            return Err("max_bump_secs must be greater than 0".to_string());
        }
        if self.panic_key.is_empty() {
            return Err("panic_key cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for DetectionParams {
    fn validate(&self) -> Result<(), String> {
        if self.lag < 2 {
            return Err(format!("lag must be at least 2, got {}", self.lag));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(format!("threshold must be positive, got {}", self.threshold));
        }
        if !(0.0..=1.0).contains(&self.influence) {
            return Err(format!(
                "influence must be between 0 and 1, got {}",
                self.influence
            ));
        }
        Ok(())
    }
}

impl Validate for RetentionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.app_max_age_days <= 0 || self.event_max_age_days <= 0 {
            return Err("Retention periods must be at least one day".to_string());
        }
        if self.app_max_age_days > MAX_RETENTION_DAYS || self.event_max_age_days > MAX_RETENTION_DAYS {
            return Err(format!(
                "Retention periods must not exceed {} days",
                MAX_RETENTION_DAYS
            ));
        }
        Ok(())
    }
}

impl Validate for SchedulerConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some((name, _)) = self.periods().iter().find(|(_, p)| p.is_zero()) {
            return Err(format!("Scheduler period for {} must be greater than 0", name));
        }
        if self.detect_concurrency == 0 {
            return Err("detect_concurrency must be greater than 0".to_string());
        }
        Ok(())
    }
}
