// # Memory Fact Store
//
// In-memory implementation of FactStore, used by tests and embedded setups.
// Holds the raw text form so malformed-content handling can be exercised
// exactly like the file store.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::AddressFamily;
use crate::traits::fact_store::FactStore;

/// In-memory fact store implementation
#[derive(Debug, Clone)]
pub struct MemoryFactStore {
    raw: Arc<RwLock<Option<String>>>,
    family: AddressFamily,
}

impl MemoryFactStore {
    /// Create an empty store (no fact published)
    pub fn new(family: AddressFamily) -> Self {
        Self {
            raw: Arc::new(RwLock::new(None)),
            family,
        }
    }

    /// Publish a valid IP
    pub async fn publish(&self, ip: IpAddr) {
        *self.raw.write().await = Some(ip.to_string());
    }

    /// Set arbitrary raw content (for exercising the validation boundary)
    pub async fn set_raw(&self, content: impl Into<String>) {
        *self.raw.write().await = Some(content.into());
    }

    /// Remove the fact entirely
    pub async fn clear(&self) {
        *self.raw.write().await = None;
    }
}

#[async_trait]
impl FactStore for MemoryFactStore {
    async fn load(&self) -> Result<Option<IpAddr>, Error> {
        match self.raw.read().await.as_deref() {
            None => Ok(None),
            Some(content) => self.family.parse(content).map(Some),
        }
    }
}
