//! Recipe applicability filtering.
//!
//! Filtering happens in two layers. Context selection (explicit recipe
//! names, skip-category flags) is a pure function over the catalog.
//! Discovery requirements then gate the survivors: each declared requirement
//! command is executed against the host, and a failure means the recipe is
//! not applicable, never that the run errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::InstallerContext;
use crate::discovery::DiscoveryManifest;
use crate::recipe::{DiscoveryRequirement, Recipe, RecipeCategory};

/// Time budget for a single requirement command.
const REQUIREMENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of filtering one catalog against a run's context and host.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Recipes that will be offered for installation.
    pub retained: Vec<Recipe>,
    /// Recipes excluded by the context's skip flags or name targeting.
    pub skipped: Vec<Recipe>,
}

/// Evaluates a recipe's discovery requirement against the host.
///
/// The production implementation shells out; tests substitute a static one.
#[async_trait]
pub trait RequirementCheck: Send + Sync {
    /// Whether the requirement holds on this host.
    async fn check(&self, requirement: &DiscoveryRequirement, manifest: &DiscoveryManifest)
        -> bool;
}

/// Runs requirement commands through the shell with a bounded timeout.
///
/// The discovered OS and architecture are exported to the command as
/// `OBSERVA_OS` and `OBSERVA_ARCH` so requirements can branch on host facts
/// without re-inspecting them.
#[derive(Debug, Clone, Default)]
pub struct ShellRequirementCheck;

#[async_trait]
impl RequirementCheck for ShellRequirementCheck {
    async fn check(
        &self,
        requirement: &DiscoveryRequirement,
        manifest: &DiscoveryManifest,
    ) -> bool {
        let command = requirement.command();

        // A missing program fails the requirement without spawning a shell.
        // Tokens with '/' or '=' (paths, env prefixes) go straight to the
        // shell.
        if let Some(program) = command.split_whitespace().next() {
            if !program.contains(['/', '=']) && which::which(program).is_err() {
                tracing::debug!(%command, %program, "requirement program not on PATH");
                return false;
            }
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .env("OBSERVA_OS", &manifest.os)
            .env("OBSERVA_ARCH", &manifest.arch)
            .kill_on_drop(true);

        let output = match timeout(REQUIREMENT_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::debug!(%command, error = %e, "requirement command could not run");
                return false;
            }
            Err(_) => {
                tracing::debug!(%command, "requirement command timed out");
                return false;
            }
        };

        if !output.status.success() {
            return false;
        }

        match requirement.expected_pattern() {
            None => true,
            Some(pattern) => {
                let re = match Regex::new(pattern) {
                    Ok(re) => re,
                    Err(e) => {
                        tracing::debug!(%pattern, error = %e, "invalid requirement pattern");
                        return false;
                    }
                };
                let stdout = String::from_utf8_lossy(&output.stdout);
                re.is_match(&stdout)
            }
        }
    }
}

/// Apply the context's name targeting and skip flags to a catalog.
///
/// Pure and synchronous: the same inputs always partition the same way.
pub fn partition_by_context(
    recipes: &[Recipe],
    context: &InstallerContext,
) -> (Vec<Recipe>, Vec<Recipe>) {
    let mut retained = Vec::new();
    let mut skipped = Vec::new();

    for recipe in recipes {
        if !context.recipe_names.is_empty() && !context.recipe_names.contains(&recipe.name) {
            skipped.push(recipe.clone());
            continue;
        }

        let excluded = match recipe.category() {
            RecipeCategory::Infrastructure => context.skip_infra,
            RecipeCategory::Logging => context.skip_logging,
            RecipeCategory::Apm => context.skip_apm,
            RecipeCategory::Integration => context.skip_integrations,
        };
        if excluded {
            skipped.push(recipe.clone());
        } else {
            retained.push(recipe.clone());
        }
    }

    (retained, skipped)
}

/// Filters the fetched catalog down to the recipes applicable to this run.
pub struct RecipeFilter {
    context: InstallerContext,
    check: Arc<dyn RequirementCheck>,
}

impl RecipeFilter {
    /// Create a filter for one run's context.
    pub fn new(context: InstallerContext, check: Arc<dyn RequirementCheck>) -> Self {
        Self { context, check }
    }

    /// Partition the catalog into retained and skipped recipes.
    ///
    /// Recipes whose discovery requirement fails are dropped silently (not
    /// applicable on this host); they appear in neither list.
    pub async fn filter(
        &self,
        manifest: &DiscoveryManifest,
        recipes: &[Recipe],
    ) -> FilterOutcome {
        let (candidates, skipped) = partition_by_context(recipes, &self.context);

        let mut retained = Vec::with_capacity(candidates.len());
        for recipe in candidates {
            match &recipe.pre_install.require_at_discovery {
                None => retained.push(recipe),
                Some(requirement) => {
                    if self.check.check(requirement, manifest).await {
                        retained.push(recipe);
                    } else {
                        tracing::debug!(recipe = %recipe.name, "discovery requirement not met");
                    }
                }
            }
        }

        FilterOutcome { retained, skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{PreInstall, INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME};

    fn named(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn with_requirement(name: &str, requirement: DiscoveryRequirement) -> Recipe {
        Recipe {
            name: name.to_string(),
            pre_install: PreInstall {
                require_at_discovery: Some(requirement),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn catalog() -> Vec<Recipe> {
        vec![
            named(INFRA_AGENT_RECIPE_NAME),
            named(LOGGING_RECIPE_NAME),
            named("mysql-integration"),
        ]
    }

    #[test]
    fn test_partition_is_idempotent() {
        let recipes = catalog();
        let context = InstallerContext {
            skip_logging: true,
            ..Default::default()
        };

        let first = partition_by_context(&recipes, &context);
        let second = partition_by_context(&recipes, &context);
        let names = |v: &[Recipe]| v.iter().map(|r| r.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first.0), names(&second.0));
        assert_eq!(names(&first.1), names(&second.1));
    }

    #[test]
    fn test_partition_skip_flags() {
        let recipes = catalog();
        let context = InstallerContext {
            skip_logging: true,
            skip_integrations: true,
            ..Default::default()
        };

        let (retained, skipped) = partition_by_context(&recipes, &context);
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].name, INFRA_AGENT_RECIPE_NAME);
        assert_eq!(skipped.len(), 2);
    }

    #[test]
    fn test_partition_name_targeting() {
        let recipes = catalog();
        let context = InstallerContext {
            recipe_names: vec![LOGGING_RECIPE_NAME.to_string()],
            ..Default::default()
        };

        let (retained, skipped) = partition_by_context(&recipes, &context);
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].name, LOGGING_RECIPE_NAME);
        assert_eq!(skipped.len(), 2);
    }

    #[tokio::test]
    async fn test_shell_check_passing_command() {
        let check = ShellRequirementCheck;
        let manifest = DiscoveryManifest::default();
        assert!(
            check
                .check(&DiscoveryRequirement::Command("true".to_string()), &manifest)
                .await
        );
    }

    #[tokio::test]
    async fn test_shell_check_failing_command() {
        let check = ShellRequirementCheck;
        let manifest = DiscoveryManifest::default();
        assert!(
            !check
                .check(&DiscoveryRequirement::Command("false".to_string()), &manifest)
                .await
        );
    }

    #[tokio::test]
    async fn test_shell_check_missing_program() {
        let check = ShellRequirementCheck;
        let manifest = DiscoveryManifest::default();
        let requirement =
            DiscoveryRequirement::Command("definitely_not_a_real_program_xyz123".to_string());
        assert!(!check.check(&requirement, &manifest).await);
    }

    #[tokio::test]
    async fn test_shell_check_output_pattern() {
        let check = ShellRequirementCheck;
        let manifest = DiscoveryManifest::default();

        let matching = DiscoveryRequirement::CommandWithPattern {
            command: "echo linux-host".to_string(),
            expected_pattern: "linux".to_string(),
        };
        assert!(check.check(&matching, &manifest).await);

        let non_matching = DiscoveryRequirement::CommandWithPattern {
            command: "echo windows-host".to_string(),
            expected_pattern: "linux".to_string(),
        };
        assert!(!check.check(&non_matching, &manifest).await);
    }

    struct StaticCheck(bool);

    #[async_trait]
    impl RequirementCheck for StaticCheck {
        async fn check(&self, _: &DiscoveryRequirement, _: &DiscoveryManifest) -> bool {
            self.0
        }
    }

    #[tokio::test]
    async fn test_filter_drops_inapplicable_recipes() {
        let recipes = vec![
            named("always-applicable"),
            with_requirement(
                "gated",
                DiscoveryRequirement::Command("which docker".to_string()),
            ),
        ];
        let filter = RecipeFilter::new(InstallerContext::default(), Arc::new(StaticCheck(false)));

        let outcome = filter.filter(&DiscoveryManifest::default(), &recipes).await;
        assert_eq!(outcome.retained.len(), 1);
        assert_eq!(outcome.retained[0].name, "always-applicable");
        // Inapplicable recipes are neither retained nor reported skipped.
        assert!(outcome.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_filter_keeps_gated_recipe_when_requirement_holds() {
        let recipes = vec![with_requirement(
            "gated",
            DiscoveryRequirement::Command("true".to_string()),
        )];
        let filter = RecipeFilter::new(InstallerContext::default(), Arc::new(StaticCheck(true)));

        let outcome = filter.filter(&DiscoveryManifest::default(), &recipes).await;
        assert_eq!(outcome.retained.len(), 1);
    }
}
