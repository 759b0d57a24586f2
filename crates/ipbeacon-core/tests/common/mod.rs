//! Test doubles and common utilities for engine contract tests
//!
//! These doubles are counter-instrumented so tests can assert on side
//! effects (how many transport writes happened, what was sent) instead of
//! timing.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ipbeacon_core::config::{
    AddressFamily, CacheStoreConfig, LookupConfig, PublishConfig, TransportConfig,
};
use ipbeacon_core::error::{Error, Result};
use ipbeacon_core::traits::{IpSource, Transport};

/// A minimal valid configuration for engine construction
pub fn minimal_config() -> PublishConfig {
    PublishConfig {
        lookup: LookupConfig::Http {
            urls: vec!["https://api.ipify.org".to_string()],
            timeout_secs: 5,
            family: AddressFamily::V4,
        },
        transport: TransportConfig::Scp {
            host: "user@publisher.example.com".to_string(),
            remote_path: "/var/www/html/myip.txt".to_string(),
            identity_file: None,
            strict_host_key: true,
            timeout_secs: 30,
        },
        cache_store: CacheStoreConfig::Memory,
        engine: Default::default(),
    }
}

/// An IP source that always returns the same address
#[derive(Clone)]
pub struct FixedIpSource {
    ip: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// An IP source that plays back a scripted sequence of lookup results,
/// one per tick
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<std::sync::Mutex<VecDeque<Result<IpAddr>>>>,
}

impl ScriptedIpSource {
    pub fn new(results: Vec<Result<IpAddr>>) -> Self {
        Self {
            script: Arc::new(std::sync::Mutex::new(results.into())),
        }
    }

    /// Convenience constructor from address strings
    pub fn from_ips(ips: &[&str]) -> Self {
        Self::new(ips.iter().map(|s| Ok(s.parse().unwrap())).collect())
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::lookup("script exhausted")))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A transport that records every send and can be switched between
/// succeeding and failing
#[derive(Clone)]
pub struct MockTransport {
    send_call_count: Arc<AtomicUsize>,
    sent: Arc<std::sync::Mutex<Vec<IpAddr>>>,
    failing: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            send_call_count: Arc::new(AtomicUsize::new(0)),
            sent: Arc::new(std::sync::Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing() -> Self {
        let transport = Self::new();
        transport.set_failing(true);
        transport
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of send attempts, successful or not
    pub fn send_call_count(&self) -> usize {
        self.send_call_count.load(Ordering::SeqCst)
    }

    /// Values of all successful sends, in order
    pub fn sent(&self) -> Vec<IpAddr> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, ip: IpAddr) -> Result<()> {
        self.send_call_count.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::transport("connection refused"));
        }

        self.sent.lock().unwrap().push(ip);
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}
