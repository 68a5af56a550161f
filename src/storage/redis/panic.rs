//! Panic flag kept in Redis
//!
//! Every read goes to Redis so all workers see a change immediately.

use super::pool::RedisPool;
use crate::core::sampling::PanicFlag;
use crate::utils::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct RedisPanicFlag {
    pool: RedisPool,
    key: String,
}

impl RedisPanicFlag {
    pub fn new(pool: RedisPool, key: impl Into<String>) -> Self {
        Self {
            pool,
            key: key.into(),
        }
    }
}

#[async_trait]
impl PanicFlag for RedisPanicFlag {
    async fn is_set(&self) -> Result<bool> {
        self.pool.exists(&self.key).await
    }

    async fn set(&self) -> Result<()> {
        self.pool.set(&self.key, "1").await
    }

    async fn clear(&self) -> Result<()> {
        self.pool.delete(&self.key).await
    }
}
