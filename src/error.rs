//! Error types for installation runs.
//!
//! The taxonomy distinguishes errors that abort a whole run (catalog fetch
//! failure, hard discovery failure) from per-recipe errors that are absorbed
//! into status state, and from user cancellation, which is not a failure at
//! all. Only fatal-to-run errors escape [`RecipeInstaller::install`].
//!
//! [`RecipeInstaller::install`]: crate::installer::RecipeInstaller::install

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during an installation run.
///
/// Each variant carries enough context to tell the user what went wrong, and
/// [`InstallError::fix_suggestion`] maps it to an actionable next step.
///
/// # Example
///
/// ```rust
/// use observa_install::InstallError;
///
/// fn handle_error(error: InstallError) {
///     if error.is_interrupt() {
///         // clean exit, not a failure
///         return;
///     }
///     eprintln!("Installation failed: {}", error);
///     eprintln!("To fix: {}", error.fix_suggestion());
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The recipe catalog could not be fetched. Fatal to the run.
    #[error("Could not fetch the recipe catalog: {message}")]
    FetchFailed {
        /// Description of the fetch failure.
        message: String,
    },

    /// A recipe file could not be loaded or parsed.
    #[error("Could not load recipe file {path}: {message}")]
    RecipeFileLoad {
        /// Path of the offending file.
        path: PathBuf,
        /// Parse or IO error description.
        message: String,
    },

    /// Host inspection failed badly enough that no manifest could be built.
    ///
    /// Degraded discovery (process enumeration failing) does not produce
    /// this; it yields an empty manifest instead.
    #[error("Host discovery failed: {message}")]
    DiscoveryFailed {
        /// Description of the discovery failure.
        message: String,
    },

    /// A recipe's install procedure exited non-zero or could not be spawned.
    ///
    /// Recorded as `Failed` for that recipe only; the run continues.
    #[error("Recipe '{recipe}' failed to install: {message}")]
    ExecutionFailed {
        /// Name of the recipe that failed.
        recipe: String,
        /// Description of the failure.
        message: String,
        /// Exit code from the install procedure, if it ran.
        exit_code: Option<i32>,
        /// Captured standard error, if any.
        stderr: Option<String>,
    },

    /// A recipe's install procedure ran past its time budget.
    #[error("Recipe '{recipe}' timed out after {duration:?}")]
    ExecutionTimeout {
        /// Name of the recipe that timed out.
        recipe: String,
        /// How long the procedure was allowed to run.
        duration: Duration,
    },

    /// Telemetry never arrived for an installed recipe within the poll budget.
    ///
    /// The executor succeeded but the backend shows no data, so the recipe
    /// cannot be confirmed as installed.
    #[error("No data found for recipe '{recipe}' after {attempts} checks")]
    ValidationTimeout {
        /// Name of the recipe that could not be confirmed.
        recipe: String,
        /// How many telemetry queries were attempted.
        attempts: u32,
    },

    /// A telemetry query itself failed (backend error, not empty results).
    #[error("Telemetry query failed: {message}")]
    QueryFailed {
        /// Description of the query failure.
        message: String,
    },

    /// The user interrupted the run (signal or declined confirmation).
    ///
    /// A clean exit, never reported as a failure.
    #[error("installation interrupted")]
    Interrupted,

    /// No active profile to read the license key and account from.
    #[error("no default profile is configured")]
    MissingProfile,
}

impl InstallError {
    /// Whether this error represents user cancellation rather than failure.
    ///
    /// Callers use this to exit cleanly without printing an error banner.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// An actionable suggestion for resolving this error.
    pub fn fix_suggestion(&self) -> &'static str {
        match self {
            Self::FetchFailed { .. } => {
                "Check your network connection and profile configuration, then re-run the install"
            }
            Self::RecipeFileLoad { .. } => {
                "Verify the recipe path exists and the file is valid YAML"
            }
            Self::DiscoveryFailed { .. } => {
                "Re-run with elevated permissions so host processes can be inspected"
            }
            Self::ExecutionFailed { .. } => "See the install output above for details",
            Self::ExecutionTimeout { .. } => {
                "Re-run with a longer execution timeout or check network connectivity"
            }
            Self::ValidationTimeout { .. } => {
                "The agent may still be starting; check the platform in a few minutes"
            }
            Self::QueryFailed { .. } => "Verify your API key and region configuration",
            Self::Interrupted => "Re-run the install to pick up where you left off",
            Self::MissingProfile => "Create a default profile before installing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_is_not_a_failure() {
        assert!(InstallError::Interrupted.is_interrupt());
        assert!(!InstallError::FetchFailed {
            message: "503".to_string()
        }
        .is_interrupt());
    }

    #[test]
    fn test_execution_failed_display() {
        let error = InstallError::ExecutionFailed {
            recipe: "infrastructure-agent-installer".to_string(),
            message: "installer exited with code 1".to_string(),
            exit_code: Some(1),
            stderr: Some("permission denied".to_string()),
        };
        assert!(error.to_string().contains("infrastructure-agent-installer"));
        assert!(error.to_string().contains("exited with code 1"));
    }

    #[test]
    fn test_validation_timeout_display() {
        let error = InstallError::ValidationTimeout {
            recipe: "logs-integration".to_string(),
            attempts: 60,
        };
        assert!(error.to_string().contains("logs-integration"));
        assert!(error.to_string().contains("60"));
    }

    #[test]
    fn test_all_variants_have_fix() {
        let errors = vec![
            InstallError::FetchFailed {
                message: "connection refused".to_string(),
            },
            InstallError::RecipeFileLoad {
                path: PathBuf::from("/tmp/recipe.yml"),
                message: "invalid yaml".to_string(),
            },
            InstallError::DiscoveryFailed {
                message: "ps not found".to_string(),
            },
            InstallError::ExecutionFailed {
                recipe: "r".to_string(),
                message: "failed".to_string(),
                exit_code: None,
                stderr: None,
            },
            InstallError::ExecutionTimeout {
                recipe: "r".to_string(),
                duration: Duration::from_secs(300),
            },
            InstallError::ValidationTimeout {
                recipe: "r".to_string(),
                attempts: 3,
            },
            InstallError::QueryFailed {
                message: "401".to_string(),
            },
            InstallError::Interrupted,
            InstallError::MissingProfile,
        ];

        for error in errors {
            assert!(
                !error.fix_suggestion().is_empty(),
                "fix_suggestion() should be non-empty for {:?}",
                error
            );
        }
    }
}
