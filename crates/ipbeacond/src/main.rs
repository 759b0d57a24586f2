// # ipbeacond - origin-side daemon
//
// Thin integration layer for the detector:
// 1. Read configuration from environment variables
// 2. Initialize tracing and the runtime
// 3. Wire the HTTP lookup, the scp transport and the cache store into the
//    publish engine
// 4. Run one tick (single-shot mode) or the continuous loop
//
// All detect/compare/push/commit logic lives in ipbeacon-core; nothing in
// this binary decides whether a push is needed.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Destination
// - `IPBEACON_REMOTE_HOST`: Remote destination, e.g. "user@server.com" (required)
// - `IPBEACON_REMOTE_PATH`: Absolute fact-file path on the remote host
//   (default "/var/www/html/myip.txt")
// - `IPBEACON_SSH_KEY`: Path to an ssh identity file (optional)
// - `IPBEACON_STRICT_HOST_KEY`: Verify the remote host key (default "true")
// - `IPBEACON_TRANSPORT_TIMEOUT_SECS`: Per-push timeout (default 30)
//
// ### Lookup
// - `IPBEACON_LOOKUP_URLS`: Comma-separated service URLs, first success wins
//   (default: ifconfig.me, api.ipify.org, icanhazip.com, checkip.amazonaws.com)
// - `IPBEACON_LOOKUP_TIMEOUT_SECS`: Per-request timeout (default 5)
// - `IPBEACON_ADDRESS_FAMILY`: v4, v6, or any (default v4)
//
// ### Cache
// - `IPBEACON_CACHE_STORE`: file or memory (default file)
// - `IPBEACON_CACHE_PATH`: Cache file path (default "~/.ipbeacon/cached_ip.txt")
//
// ### Loop
// - `IPBEACON_INTERVAL_SECS`: Tick interval in continuous mode (default 300)
// - `IPBEACON_RUN_ONCE`: Perform exactly one tick and exit, for
//   scheduler-driven invocation (default "false")
// - `IPBEACON_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export IPBEACON_REMOTE_HOST=lab@publisher.example.com
// export IPBEACON_REMOTE_PATH=/var/www/html/myip.txt
// export IPBEACON_SSH_KEY=/home/lab/.ssh/id_ed25519
//
// ipbeacond
// ```

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use ipbeacon_core::config::{
    AddressFamily, CacheStoreConfig, EngineConfig, LookupConfig, MAX_POLL_INTERVAL_SECS,
    MIN_POLL_INTERVAL_SECS, PublishConfig, TransportConfig,
};
use ipbeacon_core::{FileCacheStore, MemoryCacheStore, PublishEngine, TickOutcome};
use ipbeacon_core::traits::CacheStore;
use ipbeacon_lookup_http::{DEFAULT_SERVICES, HttpIpSource};
use ipbeacon_transport_scp::ScpTransport;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown / successful single-shot tick
/// - 1: Configuration or startup error
/// - 2: Runtime error (failed single-shot tick, unexpected failure)
#[derive(Debug, Clone, Copy)]
enum DetectorExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DetectorExitCode> for ExitCode {
    fn from(code: DetectorExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    remote_host: String,
    remote_path: String,
    ssh_key: Option<String>,
    strict_host_key: bool,
    transport_timeout_secs: u64,
    lookup_urls: Vec<String>,
    lookup_timeout_secs: u64,
    address_family: String,
    cache_store: String,
    cache_path: String,
    interval_secs: u64,
    run_once: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());

        Ok(Self {
            remote_host: env::var("IPBEACON_REMOTE_HOST").map_err(|_| {
                anyhow::anyhow!(
                    "IPBEACON_REMOTE_HOST is required. \
                    Set it via: export IPBEACON_REMOTE_HOST=user@server.com"
                )
            })?,
            remote_path: env::var("IPBEACON_REMOTE_PATH")
                .unwrap_or_else(|_| "/var/www/html/myip.txt".to_string()),
            ssh_key: env::var("IPBEACON_SSH_KEY").ok(),
            strict_host_key: parse_bool(
                &env::var("IPBEACON_STRICT_HOST_KEY").unwrap_or_else(|_| "true".to_string()),
            )?,
            transport_timeout_secs: env::var("IPBEACON_TRANSPORT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            lookup_urls: env::var("IPBEACON_LOOKUP_URLS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect()),
            lookup_timeout_secs: env::var("IPBEACON_LOOKUP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            address_family: env::var("IPBEACON_ADDRESS_FAMILY")
                .unwrap_or_else(|_| "v4".to_string()),
            cache_store: env::var("IPBEACON_CACHE_STORE").unwrap_or_else(|_| "file".to_string()),
            cache_path: env::var("IPBEACON_CACHE_PATH")
                .unwrap_or_else(|_| format!("{home}/.ipbeacon/cached_ip.txt")),
            interval_secs: env::var("IPBEACON_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
            run_once: parse_bool(
                &env::var("IPBEACON_RUN_ONCE").unwrap_or_else(|_| "false".to_string()),
            )?,
            log_level: env::var("IPBEACON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.remote_host.is_empty() || self.remote_host.contains(char::is_whitespace) {
            anyhow::bail!(
                "IPBEACON_REMOTE_HOST must be a host or user@host, got: {:?}",
                self.remote_host
            );
        }

        if !self.remote_path.starts_with('/') {
            anyhow::bail!(
                "IPBEACON_REMOTE_PATH must be absolute, got: {}",
                self.remote_path
            );
        }

        if self.lookup_urls.is_empty() {
            anyhow::bail!("IPBEACON_LOOKUP_URLS must contain at least one URL");
        }

        if self.transport_timeout_secs == 0 {
            anyhow::bail!("IPBEACON_TRANSPORT_TIMEOUT_SECS must be > 0");
        }

        if self.lookup_timeout_secs == 0 {
            anyhow::bail!("IPBEACON_LOOKUP_TIMEOUT_SECS must be > 0");
        }

        self.address_family
            .parse::<AddressFamily>()
            .map_err(|e| anyhow::anyhow!("IPBEACON_ADDRESS_FAMILY: {e}"))?;

        if !self.run_once
            && !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&self.interval_secs)
        {
            anyhow::bail!(
                "IPBEACON_INTERVAL_SECS must be between {MIN_POLL_INTERVAL_SECS} and \
                {MAX_POLL_INTERVAL_SECS} seconds. Got: {}",
                self.interval_secs
            );
        }

        match self.cache_store.as_str() {
            "file" | "memory" => {}
            other => anyhow::bail!(
                "IPBEACON_CACHE_STORE '{other}' is not supported. Supported types: file, memory"
            ),
        }

        if self.cache_store == "file" && self.cache_path.is_empty() {
            anyhow::bail!("IPBEACON_CACHE_PATH cannot be empty when IPBEACON_CACHE_STORE=file");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "IPBEACON_LOG_LEVEL '{other}' is not valid. \
                Valid levels: trace, debug, info, warn, error"
            ),
        }

        Ok(())
    }

    /// Assemble the core configuration (validated again by the engine)
    fn to_publish_config(&self) -> Result<PublishConfig> {
        let family = self
            .address_family
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        Ok(PublishConfig {
            lookup: LookupConfig::Http {
                urls: self.lookup_urls.clone(),
                timeout_secs: self.lookup_timeout_secs,
                family,
            },
            transport: TransportConfig::Scp {
                host: self.remote_host.clone(),
                remote_path: self.remote_path.clone(),
                identity_file: self.ssh_key.clone(),
                strict_host_key: self.strict_host_key,
                timeout_secs: self.transport_timeout_secs,
            },
            cache_store: match self.cache_store.as_str() {
                "memory" => CacheStoreConfig::Memory,
                _ => CacheStoreConfig::File {
                    path: self.cache_path.clone(),
                },
            },
            engine: EngineConfig {
                // Single-shot mode never sleeps; keep the interval in range
                // so engine construction does not reject it.
                poll_interval_secs: if self.run_once {
                    self.interval_secs.clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS)
                } else {
                    self.interval_secs
                },
                ..Default::default()
            },
        })
    }
}

/// Parse a boolean environment value
fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => anyhow::bail!("expected a boolean (true/false), got: {other:?}"),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return DetectorExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return DetectorExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return DetectorExitCode::ConfigError.into();
    }

    info!("starting ipbeacond");
    info!(
        "destination: {}:{}",
        config.remote_host, config.remote_path
    );

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return DetectorExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_detector(config).await {
            Ok(()) => DetectorExitCode::CleanShutdown,
            Err(e) => {
                error!("detector error: {e}");
                DetectorExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the components together and run the engine
async fn run_detector(config: Config) -> Result<()> {
    let publish_config = config.to_publish_config()?;

    let ip_source = HttpIpSource::from_config(&publish_config.lookup)?;
    let transport = ScpTransport::from_config(&publish_config.transport)?;

    let cache: Box<dyn CacheStore> = match &publish_config.cache_store {
        CacheStoreConfig::File { path } => Box::new(FileCacheStore::new(path).await?),
        CacheStoreConfig::Memory => Box::new(MemoryCacheStore::new()),
    };

    let (engine, _events) = PublishEngine::new(
        Box::new(ip_source),
        Box::new(transport),
        cache,
        publish_config,
    )?;

    if config.run_once {
        // Scheduler-driven invocation: one tick, outcome as exit status
        match engine.tick().await? {
            TickOutcome::Published { ip, previous } => {
                info!(%ip, ?previous, "published new IP");
            }
            TickOutcome::Unchanged { ip } => {
                info!(%ip, "IP unchanged, nothing pushed");
            }
        }
        return Ok(());
    }

    engine.run().await?;
    Ok(())
}
