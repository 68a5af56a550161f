//! Global panic flag

use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared switch forcing every served sample rate to zero
///
/// Implementations must not cache: a set or clear is visible to the next
/// read from any process sharing the backend.
#[async_trait]
pub trait PanicFlag: Send + Sync {
    async fn is_set(&self) -> Result<bool>;
    async fn set(&self) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Process-local flag, used when no key-value store is configured
#[derive(Debug, Default)]
pub struct InMemoryPanicFlag {
    flag: AtomicBool,
}

impl InMemoryPanicFlag {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PanicFlag for InMemoryPanicFlag {
    async fn is_set(&self) -> Result<bool> {
        Ok(self.flag.load(Ordering::SeqCst))
    }

    async fn set(&self) -> Result<()> {
        self.flag.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.flag.store(false, Ordering::SeqCst);
        Ok(())
    }
}
