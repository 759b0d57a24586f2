//! Core publish engine
//!
//! The PublishEngine is responsible for:
//! - Resolving the current public IP via IpSource
//! - Comparing against the CacheStore for idempotency
//! - Pushing changes via Transport
//! - Committing the cache only after the transport confirms success
//!
//! ## Tick Flow
//!
//! ```text
//! ┌──────────┐     ┌────────────┐     ┌───────────┐     ┌────────────┐
//! │ IpSource │ ──▶ │ CacheStore │ ──▶ │ Transport │ ──▶ │ CacheStore │
//! │ (detect) │     │ (compare)  │     │  (push)   │     │  (commit)  │
//! └──────────┘     └────────────┘     └───────────┘     └────────────┘
//! ```
//!
//! 1. Detect the current public IP
//! 2. Compare against the last successfully pushed value
//! 3. If unchanged, stop here with zero transport side effects
//! 4. Otherwise push, and commit the cache only on confirmed success
//!
//! Ticks are strictly sequential: the loop never runs two ticks
//! concurrently, so interval boundaries cannot race. Errors are absorbed
//! into the loop (logged, next tick proceeds); nothing in a tick terminates
//! the continuous process.

use std::net::IpAddr;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::PublishConfig;
use crate::error::Result;
use crate::traits::{CacheStore, IpSource, Transport};

/// Outcome of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The detected IP differed from the cache and was pushed and committed
    Published {
        /// The newly published IP
        ip: IpAddr,
        /// The previously cached IP, if any
        previous: Option<IpAddr>,
    },

    /// The detected IP equals the cached value; no transport write occurred
    Unchanged {
        /// The current (already published) IP
        ip: IpAddr,
    },
}

/// Events emitted by the PublishEngine
///
/// "No push needed" and "push failed" leave the cache equally untouched,
/// but they are distinct events so operators can tell a quiet system from a
/// broken one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started,

    /// No lookup service returned a valid address this tick
    LookupFailed { error: String },

    /// Detected IP equals the cached value; nothing pushed
    PushSkipped { ip: IpAddr },

    /// A change was detected and the push begins
    PushStarted { ip: IpAddr, previous: Option<IpAddr> },

    /// Push confirmed and cache committed
    PushSucceeded { ip: IpAddr, previous: Option<IpAddr> },

    /// Push failed; cache left uncommitted, same value retried next tick
    PushFailed { ip: IpAddr, error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Core publish engine
///
/// The engine orchestrates the detect → compare → transport → commit
/// sequence. In continuous mode it runs one tick per configured interval
/// until a shutdown signal arrives; in single-shot mode the caller invokes
/// [`PublishEngine::tick`] exactly once and maps the outcome to an exit
/// status.
///
/// ## Lifecycle
///
/// 1. Create with [`PublishEngine::new()`]
/// 2. Either call [`PublishEngine::tick()`] once, or start the loop with
///    [`PublishEngine::run()`]
/// 3. The loop runs until SIGINT/SIGTERM (or a test-provided signal)
pub struct PublishEngine {
    /// IP source for detecting the current public address
    ip_source: Box<dyn IpSource>,

    /// Transport for pushing changes to the publisher host
    transport: Box<dyn Transport>,

    /// Cache of the last successfully pushed value
    cache: Box<dyn CacheStore>,

    /// Interval between ticks in continuous mode
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl PublishEngine {
    /// Create a new publish engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events for monitoring and tests.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        transport: Box<dyn Transport>,
        cache: Box<dyn CacheStore>,
        config: PublishConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            transport,
            cache,
            poll_interval: Duration::from_secs(config.engine.poll_interval_secs),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Perform one detect → compare → transport → commit sequence
    ///
    /// # Errors
    ///
    /// - Lookup failure (no service returned a valid address)
    /// - Transport failure (cache is left uncommitted so the change is
    ///   retried on the next tick)
    /// - Cache store I/O failure
    ///
    /// All of these are recoverable: in continuous mode the loop logs and
    /// proceeds to the next tick.
    pub async fn tick(&self) -> Result<TickOutcome> {
        // 1. Detect
        let detected = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(source = self.ip_source.source_name(), %e, "public IP lookup failed");
                self.emit_event(EngineEvent::LookupFailed { error: e.to_string() });
                return Err(e);
            }
        };
        debug!(%detected, "public IP detected");

        // 2. Compare
        let cached = self.cache.last_pushed().await?;
        if cached == Some(detected) {
            debug!(ip = %detected, "IP unchanged, nothing to push");
            self.emit_event(EngineEvent::PushSkipped { ip: detected });
            return Ok(TickOutcome::Unchanged { ip: detected });
        }

        info!(
            new = %detected,
            previous = ?cached,
            "IP change detected, pushing to publisher"
        );
        self.emit_event(EngineEvent::PushStarted { ip: detected, previous: cached });

        // 3. Transport
        if let Err(e) = self.transport.send(detected).await {
            warn!(
                transport = self.transport.transport_name(),
                ip = %detected,
                %e,
                "push failed, will retry next tick"
            );
            self.emit_event(EngineEvent::PushFailed {
                ip: detected,
                error: e.to_string(),
            });
            return Err(e);
        }

        // 4. Commit, strictly after transport success. The reverse order
        // could drop a real IP change forever: a committed-but-unpushed
        // value would make every later tick see "no change".
        self.cache.commit(detected).await?;

        info!(ip = %detected, "push confirmed and cache committed");
        self.emit_event(EngineEvent::PushSucceeded { ip: detected, previous: cached });

        Ok(TickOutcome::Published { ip: detected, previous: cached })
    }

    /// Run the engine in continuous mode
    ///
    /// Performs an immediate first tick, then one tick per configured
    /// interval, until SIGINT/SIGTERM. Tick errors are absorbed.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started);
        info!(interval = ?self.poll_interval, "publish engine started");

        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for the provided shutdown signal
            loop {
                self.absorb_tick().await;

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for SIGTERM/SIGINT
            loop {
                self.absorb_tick().await;

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = Self::shutdown_signal() => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        info!("publish engine stopped");
        Ok(())
    }

    /// Wait for SIGTERM or SIGINT
    ///
    /// Service managers stop daemons with SIGTERM; reacting to SIGINT only
    /// would leave the loop to be hard-killed after the stop timeout.
    #[cfg(unix)]
    async fn shutdown_signal() {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(%e, "failed to install SIGTERM handler, handling SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }

    /// Fallback for non-Unix platforms (SIGINT only)
    #[cfg(not(unix))]
    async fn shutdown_signal() {
        let _ = tokio::signal::ctrl_c().await;
    }

    /// Run one tick, absorbing errors into the loop
    async fn absorb_tick(&self) {
        if let Err(e) = self.tick().await {
            error!(%e, "tick failed, retrying on next tick");
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        use tokio::sync::mpsc::error::TrySendError;

        // try_send so a slow consumer never blocks the loop
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("event channel full, dropping event"),
            // No consumer at all is fine: daemons may run without draining
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Test-only helper to run the engine with a controlled shutdown signal
    ///
    /// Contract tests need deterministic shutdown. Production daemons should
    /// use `run()`, which shuts down on OS signals instead.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_outcome_distinguishes_publish_from_no_change() {
        let published = TickOutcome::Published {
            ip: "1.2.3.4".parse().unwrap(),
            previous: None,
        };
        let unchanged = TickOutcome::Unchanged {
            ip: "1.2.3.4".parse().unwrap(),
        };
        assert_ne!(published, unchanged);
    }
}
