//! Host inspection.
//!
//! The production discoverer shells out to enumerate processes and kernel
//! facts, each behind a short timeout. Enumeration failures degrade the
//! manifest instead of failing the run; discovery-gated recipes simply end
//! up inapplicable.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::discovery::DiscoveryManifest;
use crate::error::InstallError;

/// Time budget for each host inspection command.
const INSPECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Inspects the host once and produces a [`DiscoveryManifest`].
#[async_trait]
pub trait Discoverer: Send + Sync {
    /// Inspect the running host.
    async fn discover(&self) -> Result<DiscoveryManifest, InstallError>;
}

/// Discovers host facts from the process table and kernel.
///
/// # Example
///
/// ```rust,no_run
/// use observa_install::{Discoverer, ProcessDiscoverer};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let manifest = ProcessDiscoverer::default().discover().await.unwrap();
///     println!("{} processes on {}", manifest.processes.len(), manifest.os);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProcessDiscoverer;

impl ProcessDiscoverer {
    async fn capture(program: &str, args: &[&str]) -> Option<String> {
        let mut cmd = Command::new(program);
        cmd.args(args).kill_on_drop(true);

        match timeout(INSPECT_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(Ok(output)) => {
                tracing::warn!(%program, code = ?output.status.code(), "inspection command failed");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(%program, error = %e, "inspection command could not run");
                None
            }
            Err(_) => {
                tracing::warn!(%program, "inspection command timed out");
                None
            }
        }
    }

    async fn list_processes() -> Vec<String> {
        let Some(output) = Self::capture("ps", &["-eo", "comm="]).await else {
            return Vec::new();
        };

        let mut names: Vec<String> = output
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[async_trait]
impl Discoverer for ProcessDiscoverer {
    async fn discover(&self) -> Result<DiscoveryManifest, InstallError> {
        let processes = Self::list_processes().await;
        if processes.is_empty() {
            // Degraded manifest: gated recipes become inapplicable, the run
            // itself continues.
            tracing::warn!("could not enumerate host processes; continuing with empty manifest");
        }

        let platform_version = Self::capture("uname", &["-r"])
            .await
            .map(|s| s.trim().to_string());
        let hostname = Self::capture("hostname", &[])
            .await
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let manifest = DiscoveryManifest {
            processes,
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            platform_version,
            hostname,
        };

        tracing::debug!(
            processes = manifest.processes.len(),
            os = %manifest.os,
            arch = %manifest.arch,
            "host discovery complete"
        );
        Ok(manifest)
    }
}
