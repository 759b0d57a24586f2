// # HTTP IP Lookup
//
// This crate provides the HTTP-based IpSource for the ipbeacon system.
//
// ## Architecture
//
// Resolving a NAT-bound machine's public IP requires asking someone outside
// the NAT. This source queries an ordered list of external address services
// (e.g. ifconfig.me, api.ipify.org) and takes the first syntactically valid
// answer, so no single service being down can break detection. Each request
// carries its own timeout, so one hung service cannot stall the tick loop.
//
// Services answer in one of two shapes, both accepted:
//
// - plain text: `203.0.113.42\n`
// - JSON: `{"ip": "203.0.113.42"}` (api.ipify.org with `?format=json`)

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use ipbeacon_core::config::{AddressFamily, LookupConfig};
use ipbeacon_core::traits::IpSource;
use ipbeacon_core::{Error, Result};

/// Default address-lookup services, tried in order
pub const DEFAULT_SERVICES: &[&str] = &[
    "https://ifconfig.me",
    "https://api.ipify.org",
    "https://icanhazip.com",
    "https://checkip.amazonaws.com",
];

/// JSON answer shape used by some services
#[derive(Debug, Deserialize)]
struct IpAnswer {
    ip: String,
}

/// HTTP-based public-IP source
///
/// First-success-wins over the configured service list. No caching: each
/// `current()` call queries fresh, since the whole point of a tick is to
/// observe the address as it is now.
pub struct HttpIpSource {
    urls: Vec<String>,
    family: AddressFamily,
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `urls`: Ordered list of service URLs, first valid answer wins
    /// - `family`: Accepted address family
    /// - `timeout`: Per-request timeout
    pub fn new(urls: Vec<String>, family: AddressFamily, timeout: Duration) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::config("lookup URL list cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { urls, family, client })
    }

    /// Create a source with the default service list
    pub fn with_defaults(family: AddressFamily) -> Result<Self> {
        Self::new(
            DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
            family,
            Duration::from_secs(5),
        )
    }

    /// Create a source from core configuration
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        config.validate()?;
        match config {
            LookupConfig::Http { urls, timeout_secs, family } => {
                Self::new(urls.clone(), *family, Duration::from_secs(*timeout_secs))
            }
        }
    }

    /// Query a single service
    async fn fetch_from(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::lookup(format!("{url}: request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::lookup(format!("{url}: HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::lookup(format!("{url}: failed to read response: {e}")))?;

        parse_answer(&body, self.family)
            .map_err(|e| Error::lookup(format!("{url}: {e}")))
    }
}

/// Parse a service answer, accepting plain-text and JSON bodies
fn parse_answer(body: &str, family: AddressFamily) -> Result<IpAddr> {
    if let Ok(ip) = family.parse(body) {
        return Ok(ip);
    }

    // Some services wrap the address in JSON
    if let Ok(answer) = serde_json::from_str::<IpAnswer>(body.trim()) {
        return family.parse(&answer.ip);
    }

    Err(Error::lookup(format!("unparsable answer: {:?}", body.trim())))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        for url in &self.urls {
            match self.fetch_from(url).await {
                Ok(ip) => {
                    debug!(%url, %ip, "public IP resolved");
                    return Ok(ip);
                }
                Err(e) => {
                    debug!(%url, %e, "lookup service failed, trying next");
                }
            }
        }

        Err(Error::lookup(format!(
            "no address-lookup service returned a valid address ({} tried)",
            self.urls.len()
        )))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
