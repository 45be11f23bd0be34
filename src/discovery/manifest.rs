//! Host facts gathered before filtering.

use serde::{Deserialize, Serialize};

/// Snapshot of host facts used to decide which recipes apply.
///
/// Produced once per run by a [`Discoverer`] and immutable afterwards. A
/// degraded manifest (empty process list) is valid: it simply makes
/// discovery-gated recipes inapplicable.
///
/// [`Discoverer`]: crate::discovery::Discoverer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryManifest {
    /// Names of processes running on the host.
    pub processes: Vec<String>,
    /// Operating system (e.g. "linux", "macos").
    pub os: String,
    /// CPU architecture (e.g. "x86_64", "aarch64").
    pub arch: String,
    /// Kernel release, when it could be determined.
    pub platform_version: Option<String>,
    /// Host name, when it could be determined.
    pub hostname: Option<String>,
}

impl DiscoveryManifest {
    /// Whether a process with this name was observed on the host.
    ///
    /// Matching is case-insensitive on the process name.
    pub fn has_process(&self, name: &str) -> bool {
        self.processes
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name))
    }
}
