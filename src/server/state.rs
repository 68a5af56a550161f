//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::metrics::MetricsAggregator;
use crate::core::sampling::SampleRateController;
use crate::monitoring::ControllerMetrics;
use crate::storage::Store;
use std::sync::Arc;

/// HTTP server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Controller configuration (shared read-only)
    pub config: Arc<Config>,
    /// Persistence
    pub store: Arc<dyn Store>,
    /// Rate read path and operator actions
    pub rates: SampleRateController,
    /// Metric report merging
    pub aggregator: MetricsAggregator,
    /// Process counters
    pub metrics: Arc<ControllerMetrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        rates: SampleRateController,
        metrics: Arc<ControllerMetrics>,
    ) -> Self {
        let aggregator =
            MetricsAggregator::new(store.clone(), rates.defaults().clone(), metrics.clone());
        Self {
            config: Arc::new(config),
            store,
            rates,
            aggregator,
            metrics,
        }
    }
}
