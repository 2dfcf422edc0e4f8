use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::{error::AppResult, models::RfidScan};

/// Single slot holding the latest scan. Each write replaces the whole pair.
#[async_trait]
pub trait MailboxStore: Send + Sync {
    async fn load(&self) -> AppResult<Option<RfidScan>>;

    async fn store(&self, scan: RfidScan) -> AppResult<()>;

    async fn clear(&self) -> AppResult<()>;
}

/// Process-local mailbox. Not shared between server instances.
#[derive(Default)]
pub struct MemoryMailbox {
    slot: RwLock<Option<RfidScan>>,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MailboxStore for MemoryMailbox {
    async fn load(&self) -> AppResult<Option<RfidScan>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.clone())
    }

    async fn store(&self, scan: RfidScan) -> AppResult<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(scan);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
