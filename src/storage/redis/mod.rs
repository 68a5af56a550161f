//! Redis storage implementation
//!
//! - `pool` - Connection management and health checks
//! - `cache` - Key operations (set, delete, exists)
//! - `panic` - Panic flag stored under a single key

mod cache;
mod panic;
mod pool;

pub use panic::RedisPanicFlag;
pub use pool::RedisPool;
