//! Configuration types for the ipbeacon system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Main detector-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Public-IP lookup configuration
    pub lookup: LookupConfig,

    /// Transport configuration
    pub transport: TransportConfig,

    /// Cache store configuration
    pub cache_store: CacheStoreConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl PublishConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.lookup.validate()?;
        self.transport.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Which address families the system accepts, both when validating
/// lookup responses and when parsing the fact file.
///
/// Validation strictness is a policy, not a hardcoded format: operators
/// running v6-only or dual-stack setups pick the family here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4 only
    #[default]
    V4,
    /// IPv6 only
    V6,
    /// Either family
    Any,
}

impl AddressFamily {
    /// Parse a textual address under this policy.
    ///
    /// Surrounding whitespace is always tolerated (trimmed); the parsed
    /// address must belong to the configured family.
    pub fn parse(&self, text: &str) -> Result<IpAddr, crate::Error> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::malformed_fact("empty address"));
        }

        let ip: IpAddr = trimmed
            .parse()
            .map_err(|_| crate::Error::malformed_fact(format!("not an IP address: {trimmed:?}")))?;

        match self {
            AddressFamily::V4 if !ip.is_ipv4() => Err(crate::Error::malformed_fact(format!(
                "expected IPv4, got {ip}"
            ))),
            AddressFamily::V6 if !ip.is_ipv6() => Err(crate::Error::malformed_fact(format!(
                "expected IPv6, got {ip}"
            ))),
            _ => Ok(ip),
        }
    }
}

impl std::str::FromStr for AddressFamily {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v4" | "ipv4" | "4" => Ok(AddressFamily::V4),
            "v6" | "ipv6" | "6" => Ok(AddressFamily::V6),
            "any" | "both" => Ok(AddressFamily::Any),
            other => Err(crate::Error::config(format!(
                "unknown address family {other:?} (expected v4, v6, or any)"
            ))),
        }
    }
}

/// Public-IP lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LookupConfig {
    /// HTTP-based lookup against external address services
    Http {
        /// Ordered list of service URLs, first success wins
        urls: Vec<String>,
        /// Per-request timeout in seconds
        #[serde(default = "default_lookup_timeout_secs")]
        timeout_secs: u64,
        /// Accepted address family
        #[serde(default)]
        family: AddressFamily,
    },
}

impl LookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            LookupConfig::Http { urls, timeout_secs, .. } => {
                if urls.is_empty() {
                    return Err(crate::Error::config("lookup URL list cannot be empty"));
                }
                for url in urls {
                    if !url.starts_with("https://") && !url.starts_with("http://") {
                        return Err(crate::Error::config(format!(
                            "lookup URL must use http or https scheme: {url}"
                        )));
                    }
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("lookup timeout must be > 0"));
                }
                Ok(())
            }
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig::Http {
            urls: Vec::new(),
            timeout_secs: default_lookup_timeout_secs(),
            family: AddressFamily::default(),
        }
    }
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Secure-copy transport (scp over ssh, key-based auth)
    Scp {
        /// Remote destination, e.g. "user@publisher.example.com"
        host: String,
        /// Absolute path of the fact file on the remote host
        remote_path: String,
        /// Optional identity file for key-based authentication
        #[serde(default)]
        identity_file: Option<String>,
        /// Whether ssh verifies the remote host key
        #[serde(default = "default_strict_host_key")]
        strict_host_key: bool,
        /// Timeout for the whole push in seconds
        #[serde(default = "default_transport_timeout_secs")]
        timeout_secs: u64,
    },
}

impl TransportConfig {
    /// Validate the transport configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            TransportConfig::Scp { host, remote_path, timeout_secs, .. } => {
                if host.is_empty() {
                    return Err(crate::Error::config("transport host cannot be empty"));
                }
                if remote_path.is_empty() {
                    return Err(crate::Error::config("transport remote path cannot be empty"));
                }
                if !remote_path.starts_with('/') {
                    return Err(crate::Error::config(format!(
                        "transport remote path must be absolute: {remote_path}"
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("transport timeout must be > 0"));
                }
                Ok(())
            }
        }
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheStoreConfig {
    /// File-based cache store (single-line text file)
    File {
        /// Path to the cache file
        path: String,
    },

    /// In-memory cache store (not persistent; every restart re-pushes once)
    #[default]
    Memory,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between ticks in continuous mode (in seconds)
    ///
    /// This is a policy floor, not a protocol requirement: it exists to
    /// avoid hammering the lookup services and the secure channel.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    /// This prevents unbounded memory growth if no one is draining events.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            return Err(crate::Error::config(format!(
                "poll interval must be between {MIN_POLL_INTERVAL_SECS} and {MAX_POLL_INTERVAL_SECS} seconds, got {}",
                self.poll_interval_secs
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Minimum allowed tick interval
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;

/// Maximum allowed tick interval (one day)
pub const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_lookup_timeout_secs() -> u64 {
    5
}

fn default_transport_timeout_secs() -> u64 {
    30
}

fn default_strict_host_key() -> bool {
    true
}
