//! Test fixtures and data factories
//!
//! All factories create real objects, not mocks.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sampling_controller::config::{ControllerConfig, UpstreamConfig};
use sampling_controller::core::sampling::{InMemoryPanicFlag, PanicFlag};
use sampling_controller::storage::{MemoryStore, Store};
use sampling_controller::{Config, Controller};
use serde_json::{Value, json};
use std::sync::Arc;

/// Configuration pointing the upstream client at `host`
pub fn test_config(host: &str) -> Config {
    Config {
        controller: ControllerConfig {
            upstream: UpstreamConfig {
                host: host.to_string(),
                token: "test-token".to_string(),
                organization_slug: "acme".to_string(),
                timeout: 5,
                ..Default::default()
            },
            ..Default::default()
        },
    }
}

/// Controller wired to an in-memory store and panic flag
pub struct TestController {
    pub controller: Controller,
    pub store: Arc<dyn Store>,
    pub panic: Arc<dyn PanicFlag>,
}

impl TestController {
    pub fn new() -> Self {
        Self::with_config(test_config("http://127.0.0.1:9/api/0/"))
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Self {
        let panic: Arc<dyn PanicFlag> = Arc::new(InMemoryPanicFlag::new());
        let controller = Controller::with_backends(config, store.clone(), panic.clone())
            .expect("Failed to build controller");
        Self {
            controller,
            store,
            panic,
        }
    }
}

impl Default for TestController {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for stats endpoint bodies
pub struct StatsFactory;

impl StatsFactory {
    /// Hourly start of the first interval used by the factories
    pub fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    /// Interval label of the `i`th hour
    pub fn at(i: usize) -> DateTime<Utc> {
        Self::start() + Duration::hours(i as i64)
    }

    pub fn intervals(len: usize) -> Vec<String> {
        (0..len).map(|i| Self::at(i).to_rfc3339()).collect()
    }

    /// Accepted and dropped groups, the accepted one carrying `values`
    pub fn accepted(values: &[f64]) -> Value {
        json!({
            "intervals": Self::intervals(values.len()),
            "groups": [
                {
                    "by": {"category": "transaction", "outcome": "filtered"},
                    "series": {"sum(quantity)": vec![0.0; values.len()]}
                },
                {
                    "by": {"category": "transaction", "outcome": "accepted"},
                    "series": {"sum(quantity)": values}
                }
            ]
        })
    }

    /// Body without an accepted group
    pub fn without_accepted(len: usize) -> Value {
        json!({
            "intervals": Self::intervals(len),
            "groups": [
                {
                    "by": {"category": "transaction", "outcome": "rate_limited"},
                    "series": {"sum(quantity)": vec![1.0; len]}
                }
            ]
        })
    }
}
