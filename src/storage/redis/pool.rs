//! Redis connection management
//!
//! A single multiplexed connection is shared by every clone of the pool.

use crate::config::RedisConfig;
use crate::utils::error::{ControllerError, Result};
use redis::{Client, aio::MultiplexedConnection};
use std::time::Duration;
use tracing::{debug, info};

/// Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    pub(crate) connection: MultiplexedConnection,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool").finish_non_exhaustive()
    }
}

impl RedisPool {
    /// Connect to Redis
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        info!("Connecting to Redis");
        debug!("Redis URL: {}", Self::sanitize_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(ControllerError::Redis)?;

        let connection = tokio::time::timeout(
            Duration::from_secs(config.connection_timeout),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| ControllerError::config("Timed out connecting to Redis"))?
        .map_err(ControllerError::Redis)?;

        info!("Redis connection established");
        Ok(Self { connection })
    }

    /// Clone of the shared connection
    pub(crate) fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.connection();
        debug!("Performing Redis health check");
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(ControllerError::Redis)?;

        debug!("Redis health check passed");
        Ok(())
    }

    /// Sanitize Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(mut parsed) = url::Url::parse(url) {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        } else {
            "invalid_url".to_string()
        }
    }
}
