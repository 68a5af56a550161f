//! Storage layer for the controller
//!
//! The pipeline talks to persistence through the [`Store`] trait. Two
//! implementations ship: a SeaORM database (PostgreSQL or SQLite) and an
//! in-memory store for tests and single-process runs. The panic flag lives
//! in Redis when it is enabled.

/// Database storage module
pub mod database;
/// In-memory storage module
pub mod memory;
/// Redis key-value module
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryStore;

use crate::config::StorageConfig;
use crate::core::detector::{DetectionParams, DetectionResult};
use crate::core::metrics::{CounterMap, Counters, MetricFamily};
use crate::core::models::{AppDefaults, Application, Event, Project};
use crate::core::sampling::{InMemoryPanicFlag, PanicFlag};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// CRUD operations the pipeline needs from persistence
///
/// Writers use targeted updates so concurrent reports and operator actions
/// do not overwrite each other's fields.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    // Projects

    async fn get_project(&self, id: &str) -> Result<Option<Project>>;

    async fn get_or_create_project(&self, id: &str, params: &DetectionParams) -> Result<Project>;

    async fn list_project_ids(&self) -> Result<Vec<String>>;

    async fn projects_without_slug(&self) -> Result<Vec<String>>;

    /// Set slugs by project id, returns the number of projects updated
    async fn update_project_slugs(&self, slugs: &[(String, String)]) -> Result<u64>;

    /// Store the snapshot and append the events in one transaction
    async fn record_detection(
        &self,
        project_id: &str,
        result: &DetectionResult,
        events: &[Event],
    ) -> Result<()>;

    /// Delete projects no application points to, with their events
    async fn delete_projects_without_apps(&self) -> Result<u64>;

    // Applications

    async fn get_app(&self, reference: &str) -> Result<Option<Application>>;

    async fn get_or_create_app(&self, reference: &str, defaults: &AppDefaults)
    -> Result<Application>;

    async fn touch_app(&self, reference: &str, now: DateTime<Utc>) -> Result<()>;

    /// Fold a report into one family's totals and mark the application seen
    ///
    /// Read, merge and write happen as one step, so concurrent reports for
    /// the same application all count. Returns the new totals.
    async fn merge_counters(
        &self,
        reference: &str,
        family: MetricFamily,
        incoming: Counters,
        now: DateTime<Utc>,
    ) -> Result<CounterMap>;

    async fn bump_apps(
        &self,
        references: &[String],
        rate: f64,
        until: DateTime<Utc>,
    ) -> Result<u64>;

    /// Reset every window that ended before `now`
    async fn close_expired_windows(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn set_metric_collection(
        &self,
        reference: &str,
        family: MetricFamily,
        enabled: bool,
    ) -> Result<()>;

    async fn apps_without_project(&self) -> Result<Vec<String>>;

    async fn link_app(
        &self,
        reference: &str,
        project_id: &str,
        env: &str,
        command: &str,
    ) -> Result<()>;

    /// Delete applications last seen before `cutoff`
    async fn delete_apps_inactive_since(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    // Events

    async fn last_event(&self, project_id: &str) -> Result<Option<Event>>;

    /// Events of a project in timestamp order
    async fn list_events(&self, project_id: &str) -> Result<Vec<Event>>;

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Open the configured store, running migrations on databases
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn Store>> {
    if config.database.enabled {
        debug!("Connecting to database");
        let database = database::Database::new(&config.database).await?;
        database.migrate().await?;
        info!("Using database storage");
        Ok(Arc::new(database))
    } else {
        info!("Database disabled, using in-memory storage");
        Ok(Arc::new(MemoryStore::new()))
    }
}

/// Open the panic flag backend
pub async fn panic_flag(config: &StorageConfig, key: &str) -> Result<Arc<dyn PanicFlag>> {
    if config.redis.enabled {
        #[cfg(feature = "redis")]
        {
            debug!("Connecting to Redis");
            let pool = redis::RedisPool::new(&config.redis).await?;
            pool.health_check().await?;
            return Ok(Arc::new(redis::RedisPanicFlag::new(pool, key)));
        }
        #[cfg(not(feature = "redis"))]
        tracing::warn!("Redis is enabled but the redis feature is not compiled in");
    }

    debug!("Panic flag {} kept in process memory", key);
    Ok(Arc::new(InMemoryPanicFlag::new()))
}
