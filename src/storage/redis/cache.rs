//! Key operations used by the panic flag

use super::pool::RedisPool;
use crate::utils::error::{ControllerError, Result};
use redis::AsyncCommands;

impl RedisPool {
    /// Set a value without expiry
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection();
        let _: () = conn.set(key, value).await.map_err(ControllerError::Redis)?;
        Ok(())
    }

    /// Delete a key
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection();
        let _: () = conn.del(key).await.map_err(ControllerError::Redis)?;
        Ok(())
    }

    /// Check if a key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection();
        conn.exists(key).await.map_err(ControllerError::Redis)
    }
}
