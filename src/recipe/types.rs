//! Recipe data model.
//!
//! A recipe is a declarative unit describing how to install one piece of
//! telemetry software: applicability metadata, an opaque install procedure,
//! and the query used to confirm the installation is producing data. Recipes
//! are deserialized from camelCase YAML documents and never mutated.

use serde::{Deserialize, Serialize};

/// Name of the host-level infrastructure agent recipe.
///
/// The entity GUID recorded for this recipe is the host entity used for
/// post-install deep links.
pub const INFRA_AGENT_RECIPE_NAME: &str = "infrastructure-agent-installer";

/// Name of the log forwarding recipe.
pub const LOGGING_RECIPE_NAME: &str = "logs-integration";

/// Coarse recipe category used by the skip flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCategory {
    /// The host-level infrastructure agent.
    Infrastructure,
    /// Log forwarding.
    Logging,
    /// Application performance monitoring.
    Apm,
    /// Any other on-host integration.
    Integration,
}

/// A discovery-time requirement gating a recipe's applicability.
///
/// The command is executed against the host during filtering; the recipe is
/// retained only if the command succeeds and, when given, its output matches
/// `expected_pattern`. Accepts a bare command string in YAML:
///
/// ```yaml
/// preInstall:
///   requireAtDiscovery: which docker
/// ```
///
/// or the expanded form with an output pattern:
///
/// ```yaml
/// preInstall:
///   requireAtDiscovery:
///     command: docker info --format '{{.OSType}}'
///     expectedPattern: linux
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscoveryRequirement {
    /// Bare command; exit status alone decides applicability.
    Command(String),
    /// Command plus a regex the output must match.
    #[serde(rename_all = "camelCase")]
    CommandWithPattern {
        /// The command to execute.
        command: String,
        /// Regex the command output must match.
        expected_pattern: String,
    },
}

impl DiscoveryRequirement {
    /// The command to execute for this requirement.
    pub fn command(&self) -> &str {
        match self {
            Self::Command(cmd) => cmd,
            Self::CommandWithPattern { command, .. } => command,
        }
    }

    /// The output pattern, when one was declared.
    pub fn expected_pattern(&self) -> Option<&str> {
        match self {
            Self::Command(_) => None,
            Self::CommandWithPattern {
                expected_pattern, ..
            } => Some(expected_pattern),
        }
    }
}

/// Pre-install configuration: user-facing info and the discovery gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreInstall {
    /// Info text shown before the recipe is installed.
    pub info: Option<String>,
    /// Requirement that must hold for the recipe to be applicable.
    pub require_at_discovery: Option<DiscoveryRequirement>,
}

/// Post-install configuration: user-facing info shown after success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostInstall {
    /// Info text shown after the recipe is installed.
    pub info: Option<String>,
}

/// A log source pattern a logging recipe will forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMatch {
    /// Human-readable name of the log source (e.g. "docker log").
    pub name: String,
    /// File glob the forwarder will watch.
    pub file: String,
}

/// A named, declarative unit describing how to install one piece of
/// telemetry software.
///
/// Sourced from the recipe catalog (remote service or local file override)
/// and immutable for the duration of a run.
///
/// # Example
///
/// ```rust
/// use observa_install::Recipe;
///
/// let recipe: Recipe = serde_yaml::from_str(
///     r#"
/// name: logs-integration
/// displayName: Logs integration
/// validationQuery: SELECT count(*) FROM Log
/// install: |
///   echo installing
/// "#,
/// )
/// .unwrap();
/// assert_eq!(recipe.name, "logs-integration");
/// assert!(recipe.validation_query.is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipe {
    /// Unique recipe name.
    pub name: String,
    /// Friendly name for display; falls back to `name` when empty.
    pub display_name: String,
    /// Short description of what the recipe installs.
    pub description: String,
    /// Free-form keywords ("apm", "kubernetes", ...).
    pub keywords: Vec<String>,
    /// Pre-install info and discovery gate.
    pub pre_install: PreInstall,
    /// Post-install info.
    pub post_install: PostInstall,
    /// Telemetry query proving the installation produces data.
    pub validation_query: Option<String>,
    /// Log sources this recipe forwards.
    pub log_match: Vec<LogMatch>,
    /// Opaque install procedure, executed as a shell script.
    pub install: String,
}

impl Recipe {
    /// Friendly name for display, falling back to the recipe name.
    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// The category this recipe belongs to, for the skip flags.
    pub fn category(&self) -> RecipeCategory {
        if self.name == INFRA_AGENT_RECIPE_NAME {
            return RecipeCategory::Infrastructure;
        }
        if self.name == LOGGING_RECIPE_NAME || !self.log_match.is_empty() {
            return RecipeCategory::Logging;
        }
        let apm = |s: &str| s.to_ascii_lowercase().contains("apm");
        if apm(&self.name) || self.keywords.iter().any(|k| apm(k)) {
            return RecipeCategory::Apm;
        }
        RecipeCategory::Integration
    }
}
