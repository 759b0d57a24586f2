// # Memory Cache Store
//
// In-memory implementation of CacheStore.
//
// ## Crash Behavior
//
// All state is lost on restart: the first tick after a restart treats the
// detected IP as "never pushed" and performs one transport write. That is
// harmless (the push is idempotent on the publisher side) but noisy, so
// prefer the file store outside tests and containers.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::cache_store::{CacheRecord, CacheStore};

/// In-memory cache store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<RwLock<Option<CacheRecord>>>,
}

impl MemoryCacheStore {
    /// Create a new empty memory cache store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a last-pushed IP
    pub fn with_ip(ip: IpAddr) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(CacheRecord {
                ip,
                pushed_at: Some(chrono::Utc::now()),
            }))),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn last_pushed(&self) -> Result<Option<IpAddr>, Error> {
        Ok(self.inner.read().await.as_ref().map(|r| r.ip))
    }

    async fn record(&self) -> Result<Option<CacheRecord>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn commit(&self, ip: IpAddr) -> Result<(), Error> {
        *self.inner.write().await = Some(CacheRecord {
            ip,
            pushed_at: Some(chrono::Utc::now()),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty_and_commits() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.last_pushed().await.unwrap(), None);

        let ip: IpAddr = "1.2.3.4".parse().unwrap();
        store.commit(ip).await.unwrap();
        assert_eq!(store.last_pushed().await.unwrap(), Some(ip));

        let record = store.record().await.unwrap().unwrap();
        assert_eq!(record.ip, ip);
        assert!(record.pushed_at.is_some());
    }

    #[tokio::test]
    async fn prepopulated_store_reports_the_ip_as_pushed() {
        let ip: IpAddr = "203.0.113.42".parse().unwrap();
        let store = MemoryCacheStore::with_ip(ip);
        assert_eq!(store.last_pushed().await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryCacheStore::new();
        let clone = store.clone();

        store.commit("5.6.7.8".parse().unwrap()).await.unwrap();
        assert_eq!(
            clone.last_pushed().await.unwrap(),
            Some("5.6.7.8".parse().unwrap())
        );
    }
}
