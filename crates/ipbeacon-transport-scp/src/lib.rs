// # scp Transport
//
// This crate provides the secure-copy Transport for the ipbeacon system.
// The secure channel itself is an external collaborator: scp/ssh with
// key-based authentication configured out of band. This crate only decides
// what to invoke and how to interpret the result.
//
// ## Atomic remote replacement
//
// scp streams into the destination path, so copying straight onto the fact
// file would let a concurrent publisher read observe a half-written value.
// Instead the payload is copied to `<remote_path>.tmp` and then renamed
// into place with a second ssh command; rename is atomic on POSIX
// filesystems, so readers see either the old complete value or the new one.
//
// ## Error classification
//
// - scp/ssh binary missing → `Error::Config` (fatal misconfiguration)
// - nonzero exit, timeout → `Error::Transport` (transient; the engine
//   leaves the cache uncommitted and retries next tick)

use std::io::Write;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use ipbeacon_core::config::TransportConfig;
use ipbeacon_core::traits::Transport;
use ipbeacon_core::{Error, Result};

/// Transport that pushes the IP payload over scp/ssh
///
/// Authentication is key-based: either the ambient ssh agent/config or an
/// explicit identity file. `BatchMode=yes` is always set so a missing key
/// fails instead of prompting inside a daemon.
#[derive(Debug, Clone)]
pub struct ScpTransport {
    /// Remote destination, e.g. "user@publisher.example.com"
    host: String,
    /// Absolute path of the fact file on the remote host
    remote_path: String,
    /// Optional identity file for key-based authentication
    identity_file: Option<String>,
    /// Whether ssh verifies the remote host key
    strict_host_key: bool,
    /// Timeout covering each subprocess invocation
    timeout: Duration,
}

impl ScpTransport {
    /// Create a new scp transport
    pub fn new(host: impl Into<String>, remote_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            remote_path: remote_path.into(),
            identity_file: None,
            strict_host_key: true,
            timeout: Duration::from_secs(30),
        }
    }

    /// Use an explicit ssh identity file
    pub fn with_identity_file(mut self, path: impl Into<String>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Disable remote host key verification (not recommended)
    pub fn with_strict_host_key(mut self, strict: bool) -> Self {
        self.strict_host_key = strict;
        self
    }

    /// Set the per-invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a transport from core configuration
    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        config.validate()?;
        match config {
            TransportConfig::Scp {
                host,
                remote_path,
                identity_file,
                strict_host_key,
                timeout_secs,
            } => {
                let mut transport = Self::new(host, remote_path)
                    .with_strict_host_key(*strict_host_key)
                    .with_timeout(Duration::from_secs(*timeout_secs));
                if let Some(key) = identity_file {
                    transport = transport.with_identity_file(key);
                }
                Ok(transport)
            }
        }
    }

    /// Staging path on the remote host
    fn remote_temp_path(&self) -> String {
        format!("{}.tmp", self.remote_path)
    }

    /// ssh options shared by the copy and the rename
    fn common_options(&self) -> Vec<String> {
        let mut opts = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        if !self.strict_host_key {
            opts.push("-o".to_string());
            opts.push("StrictHostKeyChecking=no".to_string());
        }
        if let Some(key) = &self.identity_file {
            opts.push("-i".to_string());
            opts.push(key.clone());
        }
        opts
    }

    /// Arguments for copying the staged payload to the remote temp path
    fn scp_args(&self, local: &Path) -> Vec<String> {
        let mut args = self.common_options();
        args.push(local.display().to_string());
        args.push(format!("{}:{}", self.host, self.remote_temp_path()));
        args
    }

    /// Arguments for the atomic rename on the remote host
    fn rename_args(&self) -> Vec<String> {
        let mut args = self.common_options();
        args.push(self.host.clone());
        args.push("mv".to_string());
        args.push("-f".to_string());
        args.push(self.remote_temp_path());
        args.push(self.remote_path.clone());
        args
    }

    /// Run one subprocess, bounded by the configured timeout
    async fn run(&self, program: &str, args: &[String]) -> Result<()> {
        debug!(%program, ?args, "invoking transport command");

        let child = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                return Err(Error::transport(format!(
                    "{program} timed out after {:?}",
                    self.timeout
                )));
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::config(format!(
                    "{program} binary not found; install openssh clients"
                )));
            }
            Ok(Err(e)) => {
                return Err(Error::transport(format!("failed to spawn {program}: {e}")));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::transport(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for ScpTransport {
    async fn send(&self, ip: IpAddr) -> Result<()> {
        // Stage the one-line payload locally; the file is removed on drop
        let mut staged = tempfile::NamedTempFile::new()
            .map_err(|e| Error::transport(format!("failed to create staging file: {e}")))?;
        staged
            .write_all(ip.to_string().as_bytes())
            .and_then(|_| staged.flush())
            .map_err(|e| Error::transport(format!("failed to write staging file: {e}")))?;

        self.run("scp", &self.scp_args(staged.path())).await?;
        self.run("ssh", &self.rename_args()).await?;

        debug!(%ip, host = %self.host, path = %self.remote_path, "payload pushed");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "scp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn transport() -> ScpTransport {
        ScpTransport::new("user@publisher.example.com", "/var/www/html/myip.txt")
    }

    #[test]
    fn scp_targets_the_remote_temp_path() {
        let args = transport().scp_args(&PathBuf::from("/tmp/staged"));
        assert_eq!(
            args.last().unwrap(),
            "user@publisher.example.com:/var/www/html/myip.txt.tmp"
        );
        assert!(args.contains(&"/tmp/staged".to_string()));
    }

    #[test]
    fn rename_moves_temp_onto_fact_file() {
        let args = transport().rename_args();
        let tail: Vec<_> = args.iter().rev().take(4).rev().cloned().collect();
        assert_eq!(
            tail,
            vec![
                "mv".to_string(),
                "-f".to_string(),
                "/var/www/html/myip.txt.tmp".to_string(),
                "/var/www/html/myip.txt".to_string(),
            ]
        );
    }

    #[test]
    fn batch_mode_is_always_set() {
        let args = transport().scp_args(&PathBuf::from("/tmp/staged"));
        let joined = args.join(" ");
        assert!(joined.contains("-o BatchMode=yes"));
    }

    #[test]
    fn host_key_checking_only_disabled_on_request() {
        let strict = transport().scp_args(&PathBuf::from("/tmp/staged")).join(" ");
        assert!(!strict.contains("StrictHostKeyChecking=no"));

        let lax = transport()
            .with_strict_host_key(false)
            .scp_args(&PathBuf::from("/tmp/staged"))
            .join(" ");
        assert!(lax.contains("StrictHostKeyChecking=no"));
    }

    #[test]
    fn identity_file_is_passed_when_configured() {
        let args = transport()
            .with_identity_file("/home/lab/.ssh/id_ed25519")
            .scp_args(&PathBuf::from("/tmp/staged"));
        let joined = args.join(" ");
        assert!(joined.contains("-i /home/lab/.ssh/id_ed25519"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_config_error() {
        let transport = ScpTransport::new("user@host", "/var/www/html/myip.txt");
        let err = transport
            .run("definitely-not-a-real-binary-ipbeacon", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
