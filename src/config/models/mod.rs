//! Configuration data models
//!
//! This module defines all configuration structures used by the controller.

pub mod logging;
pub mod retention;
pub mod sampling;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod upstream;

pub use logging::*;
pub use retention::*;
pub use sampling::*;
pub use scheduler::*;
pub use server::*;
pub use storage::*;
pub use upstream::*;

pub use crate::core::detector::DetectionParams;

use serde::{Deserialize, Serialize};

/// Root of the configuration tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
    /// Database and key-value store
    #[serde(default)]
    pub storage: StorageConfig,
    /// External analytics API
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Sample rate defaults and bounds
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Default detector parameters for new projects
    #[serde(default)]
    pub detection: DetectionParams,
    /// Retention sweeps
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Periodic jobs
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8000
}

/// Default connection timeout in seconds
pub fn default_connection_timeout() -> u64 {
    5
}

/// Default maximum database connections
pub fn default_max_connections() -> u32 {
    10
}
