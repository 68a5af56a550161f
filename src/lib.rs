//! # sampling-controller
//!
//! Adaptive sampling controller for an event-ingestion backend.
//!
//! The controller periodically pulls per-project ingestion volume from the
//! analytics API, flags spikes with a smoothed z-score detector and records
//! spike start/end events. Monitored applications ask it which sample rate
//! to use; operators can bump rates for a bounded window or force every rate
//! to zero with the global panic switch.
//!
//! ## Running
//!
//! ```rust,no_run
//! use sampling_controller::{Config, Controller};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/controller.yaml").await?;
//!     let controller = Controller::new(config).await?;
//!     controller.run().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod monitoring;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use utils::error::{ControllerError, Result};

use crate::core::sampling::{PanicFlag, SampleRateController};
use crate::core::upstream::PaginatedClient;
use crate::monitoring::ControllerMetrics;
use crate::server::{AppState, HttpServer};
use crate::services::{JobContext, Scheduler};
use crate::storage::Store;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Wired-up controller: store, rate controller, jobs and HTTP state
pub struct Controller {
    config: Config,
    state: AppState,
    jobs: JobContext,
}

impl Controller {
    /// Connect the configured backends
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating controller instance");

        let store = storage::connect(config.storage()).await?;
        let panic = storage::panic_flag(config.storage(), &config.sampling().panic_key).await?;
        Self::with_backends(config, store, panic)
    }

    /// Build on already opened backends
    pub fn with_backends(
        config: Config,
        store: Arc<dyn Store>,
        panic: Arc<dyn PanicFlag>,
    ) -> Result<Self> {
        let metrics = Arc::new(ControllerMetrics::new());
        let rates = SampleRateController::new(
            store.clone(),
            panic,
            config.sampling().clone(),
            metrics.clone(),
        );
        let client = PaginatedClient::with_metrics(config.upstream(), metrics.clone())?;
        let jobs = JobContext::new(
            store.clone(),
            client,
            rates.clone(),
            config.controller.clone(),
            metrics.clone(),
        );
        let state = AppState::new(config.clone(), store, rates, metrics);

        Ok(Self {
            config,
            state,
            jobs,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rates(&self) -> &SampleRateController {
        &self.state.rates
    }

    pub fn jobs(&self) -> &JobContext {
        &self.jobs
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve HTTP and, when enabled, run the scheduler until the server stops
    pub async fn run(self) -> Result<()> {
        info!("Starting sampling controller");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = if self.config.scheduler().enabled {
            Scheduler::new(self.jobs.clone()).start(shutdown_rx)
        } else {
            info!("Scheduler disabled");
            Vec::new()
        };

        let result = HttpServer::new(self.state).start().await;

        let _ = shutdown_tx.send(true);
        for handle in handles {
            let _ = handle.await;
        }
        result
    }
}

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
