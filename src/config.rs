//! Run-scoped configuration.
//!
//! [`InstallerContext`] captures the user's flags for one installation run
//! and [`Profile`] the credentials and region the run operates under. Both
//! are built once by the embedding CLI and read-only afterwards; there is no
//! process-wide mutable state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Platform region a profile points at.
///
/// Parsed case-insensitively from profile configuration; unknown values fall
/// back to [`Region::Us`] at the call sites that read it.
///
/// # Example
///
/// ```rust
/// use std::str::FromStr;
/// use observa_install::Region;
///
/// assert_eq!(Region::from_str("eu").unwrap(), Region::Eu);
/// assert_eq!(Region::from_str("STAGING").unwrap(), Region::Staging);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Region {
    /// The staging environment.
    Staging,
    /// The US production environment.
    Us,
    /// The EU production environment.
    Eu,
}

impl Region {
    /// The platform web hostname for this region.
    pub fn platform_hostname(&self) -> &'static str {
        match self {
            Self::Staging => "staging-one.observa.io",
            Self::Us => "one.observa.io",
            Self::Eu => "one.eu.observa.io",
        }
    }
}

/// Credentials and account settings the run operates under.
///
/// Read-only input: the executor substitutes the keys into recipe variables
/// and the link generator derives hostnames and account parameters from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// The account the installed agents report to.
    pub account_id: i64,
    /// Region the account lives in.
    pub region: Region,
    /// Ingest license key handed to install procedures.
    pub license_key: String,
    /// Event insert key, when distinct from the license key.
    pub insert_key: Option<String>,
}

/// Per-run install flags, the direct equivalent of the CLI's install flags.
///
/// Owned by the orchestrator and never mutated after construction.
///
/// # Example
///
/// ```rust
/// use observa_install::InstallerContext;
///
/// let ctx = InstallerContext {
///     assume_yes: true,
///     ..Default::default()
/// };
/// assert!(ctx.recipe_names.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InstallerContext {
    /// Answer "yes" to every prompt.
    pub assume_yes: bool,
    /// Load recipes from this directory instead of the remote catalog.
    pub local_recipes: Option<PathBuf>,
    /// Only install recipes with these names.
    pub recipe_names: Vec<String>,
    /// Additional recipe files to load and install.
    pub recipe_paths: Vec<PathBuf>,
    /// Skip recommended integration recipes.
    pub skip_integrations: bool,
    /// Skip log forwarding recipes.
    pub skip_logging: bool,
    /// Skip APM recipes.
    pub skip_apm: bool,
    /// Skip the infrastructure agent recipe (targeted installs only).
    pub skip_infra: bool,
}

impl InstallerContext {
    /// Whether the user targeted specific recipes by name or path.
    pub fn is_targeted(&self) -> bool {
        !self.recipe_names.is_empty() || !self.recipe_paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_region_parse_case_insensitive() {
        assert_eq!(Region::from_str("us").unwrap(), Region::Us);
        assert_eq!(Region::from_str("US").unwrap(), Region::Us);
        assert_eq!(Region::from_str("Eu").unwrap(), Region::Eu);
        assert_eq!(Region::from_str("staging").unwrap(), Region::Staging);
        assert!(Region::from_str("mars").is_err());
    }

    #[test]
    fn test_region_renders_lowercase() {
        assert_eq!(Region::Us.to_string(), "us");
        assert_eq!(Region::Staging.to_string(), "staging");
    }

    #[test]
    fn test_region_hostnames() {
        assert_eq!(Region::Us.platform_hostname(), "one.observa.io");
        assert_eq!(Region::Eu.platform_hostname(), "one.eu.observa.io");
        assert_eq!(
            Region::Staging.platform_hostname(),
            "staging-one.observa.io"
        );
    }

    #[test]
    fn test_default_context_is_guided() {
        let ctx = InstallerContext::default();
        assert!(!ctx.is_targeted());
        assert!(!ctx.assume_yes);
        assert!(ctx.local_recipes.is_none());
    }

    #[test]
    fn test_targeted_context() {
        let ctx = InstallerContext {
            recipe_names: vec!["logs-integration".to_string()],
            ..Default::default()
        };
        assert!(ctx.is_targeted());

        let ctx = InstallerContext {
            recipe_paths: vec![PathBuf::from("recipe.yml")],
            ..Default::default()
        };
        assert!(ctx.is_targeted());
    }
}
