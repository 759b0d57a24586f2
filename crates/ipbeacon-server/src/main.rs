// # ipbeacon-server daemon
//
// Thin integration layer for the publisher side:
// 1. Read configuration from environment variables
// 2. Initialize tracing and the runtime
// 3. Serve the fact file over HTTP until SIGTERM/SIGINT
//
// ## Configuration
//
// - `IPBEACON_BIND_ADDR`: Address to bind to (default "0.0.0.0")
// - `IPBEACON_PORT`: Port to listen on (default 8080)
// - `IPBEACON_FACT_PATH`: Path to the fact file the transport writes
//   (default "/var/www/html/myip.txt")
// - `IPBEACON_ADDRESS_FAMILY`: Accepted address family: v4, v6, any
//   (default v4)
// - `IPBEACON_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export IPBEACON_PORT=8080
// export IPBEACON_FACT_PATH=/var/www/html/myip.txt
//
// ipbeacon-server
// ```

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use axum_server::Handle;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use ipbeacon_core::config::AddressFamily;
use ipbeacon_core::fact::FileFactStore;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ServerExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ServerExitCode> for ExitCode {
    fn from(code: ServerExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    bind_addr: String,
    port: u16,
    fact_path: String,
    family: AddressFamily,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: env::var("IPBEACON_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("IPBEACON_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("IPBEACON_PORT is not a valid port: {e}"))?,
            fact_path: env::var("IPBEACON_FACT_PATH")
                .unwrap_or_else(|_| "/var/www/html/myip.txt".to_string()),
            family: env::var("IPBEACON_ADDRESS_FAMILY")
                .unwrap_or_else(|_| "v4".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("{e}"))?,
            log_level: env::var("IPBEACON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.bind_addr.parse::<IpAddr>().is_err() {
            anyhow::bail!(
                "IPBEACON_BIND_ADDR is not a valid address: {}",
                self.bind_addr
            );
        }

        if self.fact_path.is_empty() {
            anyhow::bail!("IPBEACON_FACT_PATH cannot be empty");
        }
        if !self.fact_path.starts_with('/') {
            anyhow::bail!(
                "IPBEACON_FACT_PATH must be absolute, got: {}",
                self.fact_path
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "IPBEACON_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                other
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ServerExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return ServerExitCode::ConfigError.into();
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
        return ServerExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ServerExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_server(config).await {
            error!("Server error: {e}");
            ServerExitCode::RuntimeError
        } else {
            ServerExitCode::CleanShutdown
        }
    })
    .into()
}

/// Run the publisher HTTP server until a shutdown signal arrives
async fn run_server(config: Config) -> Result<()> {
    let facts = Arc::new(FileFactStore::new(&config.fact_path, config.family));
    let app = ipbeacon_server::router(facts);

    let addr = SocketAddr::new(config.bind_addr.parse()?, config.port);
    info!("ipbeacon publisher listening on http://{addr}");
    info!("fact file: {}", config.fact_path);

    let handle = Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("received {signal}, shutting down"),
            Err(e) => error!("shutdown handler error: {e}"),
        }
        shutdown_handle.graceful_shutdown(None);
    });

    axum_server::Server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    info!("publisher stopped");
    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGTERM handler: {e}"))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGINT handler: {e}"))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Fallback for non-Unix platforms (SIGINT only)
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("SIGINT")
}
