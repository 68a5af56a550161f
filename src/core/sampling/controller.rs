//! Sample rate state machine
//!
//! An application is either `Normal` (serving its default rate) or `Bumped`
//! (serving an operator-chosen rate until its window ends). A periodic sweep
//! returns lapsed windows to `Normal`; reads treat a lapsed window as
//! already closed. The global panic flag overrides both states at read time
//! and blocks new bumps.

use super::panic::PanicFlag;
use crate::config::SamplingConfig;
use crate::core::metrics::MetricFamily;
use crate::core::models::{AppDefaults, Application};
use crate::monitoring::ControllerMetrics;
use crate::storage::Store;
use crate::utils::error::{ControllerError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rate state of one application at a given instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateState {
    Normal,
    Bumped { rate: f64, until: DateTime<Utc> },
}

impl RateState {
    pub fn of(app: &Application, now: DateTime<Utc>) -> Self {
        match app.active_window_end {
            Some(until) if until >= now => Self::Bumped {
                rate: app.active_sample_rate,
                until,
            },
            _ => Self::Normal,
        }
    }
}

/// Rate a client should sample at
pub fn effective_sample_rate(app: &Application, panic: bool, now: DateTime<Utc>) -> f64 {
    if panic {
        return 0.0;
    }
    let rate = match RateState::of(app, now) {
        RateState::Bumped { rate, .. } => rate,
        // A lapsed window may not have been swept yet
        RateState::Normal if app.active_window_end.is_some() => app.default_sample_rate,
        RateState::Normal => app.active_sample_rate,
    };
    if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) }
}

/// Operator request to raise or lower a rate for a while
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BumpRequest {
    pub rate: f64,
    pub duration: Duration,
}

impl BumpRequest {
    pub fn new(rate: f64, duration: Duration) -> Self {
        Self { rate, duration }
    }

    /// Build a request from a duration in seconds, rejecting values chrono cannot hold
    pub fn from_secs(rate: f64, secs: i64) -> Result<Self> {
        let duration = Duration::try_seconds(secs).ok_or_else(|| {
            ControllerError::validation(format!("duration out of range: {}s", secs))
        })?;
        Ok(Self::new(rate, duration))
    }

    pub fn validate(&self, max: Duration) -> Result<()> {
        if !self.rate.is_finite() || !(0.0..=1.0).contains(&self.rate) {
            return Err(ControllerError::validation(format!(
                "sample rate must be within [0, 1], got {}",
                self.rate
            )));
        }
        if self.duration <= Duration::zero() || self.duration > max {
            return Err(ControllerError::validation(format!(
                "duration must be within (0, {}s], got {}s",
                max.num_seconds(),
                self.duration.num_seconds()
            )));
        }
        Ok(())
    }
}

/// What a client receives from the lookup endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub reference: String,
    pub active_sample_rate: f64,
    pub active_window_end: Option<DateTime<Utc>>,
    pub wsgi_ignore_path: Vec<String>,
    pub wsgi_collect_metrics: bool,
    pub celery_ignore_task: Vec<String>,
    pub celery_collect_metrics: bool,
}

/// Owns rate transitions and the read path
#[derive(Clone)]
pub struct SampleRateController {
    store: Arc<dyn Store>,
    panic: Arc<dyn PanicFlag>,
    sampling: SamplingConfig,
    defaults: AppDefaults,
    metrics: Arc<ControllerMetrics>,
}

impl SampleRateController {
    pub fn new(
        store: Arc<dyn Store>,
        panic: Arc<dyn PanicFlag>,
        sampling: SamplingConfig,
        metrics: Arc<ControllerMetrics>,
    ) -> Self {
        let defaults = AppDefaults::from(&sampling);
        Self {
            store,
            panic,
            sampling,
            defaults,
            metrics,
        }
    }

    pub fn defaults(&self) -> &AppDefaults {
        &self.defaults
    }

    /// Open a bump window on every listed application
    pub async fn bump(
        &self,
        references: &[String],
        request: BumpRequest,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        request.validate(self.sampling.max_bump())?;
        if references.is_empty() {
            return Err(ControllerError::validation("no application selected"));
        }
        if self.panic.is_set().await? {
            return Err(ControllerError::conflict("cannot bump while in panic mode"));
        }

        let until = now + request.duration;
        let updated = self.store.bump_apps(references, request.rate, until).await?;
        if updated == 0 {
            return Err(ControllerError::not_found(format!(
                "no application matches {:?}",
                references
            )));
        }

        info!(
            "Bumped {} app(s) to {} until {}",
            updated, request.rate, until
        );
        Ok(updated)
    }

    /// Return every lapsed window to the default rate
    pub async fn close_expired_windows(&self, now: DateTime<Utc>) -> Result<u64> {
        let closed = self.store.close_expired_windows(now).await?;
        self.metrics.record_windows_closed(closed);
        debug!("Closed {} expired window(s)", closed);
        Ok(closed)
    }

    pub async fn is_panic(&self) -> Result<bool> {
        self.panic.is_set().await
    }

    pub async fn panic(&self) -> Result<()> {
        if self.panic.is_set().await? {
            return Err(ControllerError::conflict("already in panic mode"));
        }
        self.panic.set().await?;
        warn!("Panic mode enabled, every sample rate is now 0");
        Ok(())
    }

    pub async fn unpanic(&self) -> Result<()> {
        if !self.panic.is_set().await? {
            return Err(ControllerError::conflict("not in panic mode"));
        }
        self.panic.clear().await?;
        info!("Panic mode disabled");
        Ok(())
    }

    /// Settings served to a client, creating its application on first sight
    pub async fn lookup(&self, reference: &str, now: DateTime<Utc>) -> Result<AppSettings> {
        let mut app = self.store.get_or_create_app(reference, &self.defaults).await?;
        self.store.touch_app(reference, now).await?;
        app.last_seen = Some(now);

        let panic = self.panic.is_set().await?;
        let active_sample_rate = effective_sample_rate(&app, panic, now);
        let active_window_end = match RateState::of(&app, now) {
            RateState::Bumped { until, .. } => Some(until),
            RateState::Normal => None,
        };

        Ok(AppSettings {
            reference: app.reference,
            active_sample_rate,
            active_window_end,
            wsgi_ignore_path: std::mem::take(&mut app.wsgi.ignore),
            wsgi_collect_metrics: app.wsgi.collect,
            celery_ignore_task: std::mem::take(&mut app.celery.ignore),
            celery_collect_metrics: app.celery.collect,
        })
    }

    /// Enable the listed families on every application, disable the others
    pub async fn set_metric_collection(
        &self,
        references: &[String],
        enabled: &[MetricFamily],
    ) -> Result<()> {
        for reference in references {
            if self.store.get_app(reference).await?.is_none() {
                return Err(ControllerError::not_found(format!(
                    "application {}",
                    reference
                )));
            }
        }

        for reference in references {
            for family in MetricFamily::ALL {
                self.store
                    .set_metric_collection(reference, family, enabled.contains(&family))
                    .await?;
            }
        }
        Ok(())
    }
}
