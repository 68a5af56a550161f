//! Merge dispatch for incoming reports

use super::{CounterMap, MetricReport};
use crate::core::models::AppDefaults;
use crate::monitoring::ControllerMetrics;
use crate::storage::Store;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Folds reports into the stored per-application totals
#[derive(Clone)]
pub struct MetricsAggregator {
    store: Arc<dyn Store>,
    defaults: AppDefaults,
    metrics: Arc<ControllerMetrics>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn Store>, defaults: AppDefaults, metrics: Arc<ControllerMetrics>) -> Self {
        Self {
            store,
            defaults,
            metrics,
        }
    }

    /// Merge a report into the application's totals and mark it seen
    ///
    /// The application is created if this is its first report.
    pub async fn ingest(
        &self,
        reference: &str,
        report: MetricReport,
        now: DateTime<Utc>,
    ) -> Result<CounterMap> {
        self.store.get_or_create_app(reference, &self.defaults).await?;
        let merged = self
            .store
            .merge_counters(reference, report.family, report.data, now)
            .await?;

        self.metrics.record_report();
        debug!(
            "Merged {} report for {} ({} groups)",
            report.family,
            reference,
            merged.len()
        );
        Ok(merged)
    }
}
