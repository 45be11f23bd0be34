//! The installation orchestrator.
//!
//! [`RecipeInstaller`] sequences one run: discover the host, fetch and
//! filter the catalog, confirm the selection, execute each recipe, confirm
//! each installation against telemetry, and emit the final success link.
//! Every stage reports through the [`StatusRollup`], and every collaborator
//! sits behind a narrow trait so production and test assemblies are
//! symmetric.

use std::sync::Arc;

use futures::future::join_all;

use crate::config::{InstallerContext, Profile};
use crate::discovery::{Discoverer, ProcessDiscoverer};
use crate::error::InstallError;
use crate::execution::{
    ExecutionOptions, RecipeExecutor, RecipeVarProvider, ShellRecipeExecutor,
};
use crate::interrupt::Interrupt;
use crate::recipe::{
    Recipe, RecipeFetcher, RecipeFileFetcher, RecipeFilter, RequirementCheck,
    ShellRequirementCheck,
};
use crate::status::{
    InstallEventsClient, InstallEventsReporter, InstallStatusSnapshot, PlatformLinkGenerator,
    StatusRollup, StatusSubscriber, SuccessLinkConfig, TerminalStatusReporter,
};
use crate::ux::{Prompter, TerminalPrompter};
use crate::validation::{PollingRecipeValidator, RecipeValidator, RetryPolicy, TelemetryClient};

/// Outcome of one installation run.
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Final per-recipe statuses.
    pub status: InstallStatusSnapshot,
    /// URL to visit after the run; empty when nothing was installed.
    pub redirect_url: String,
}

/// Assembles a [`RecipeInstaller`] from its collaborators.
///
/// Only the telemetry client is mandatory; everything else defaults to the
/// production implementation and can be swapped for a test double.
///
/// # Example
///
/// ```rust,ignore
/// let installer = RecipeInstaller::builder(context, Some(profile), telemetry)
///     .with_events_client(events)
///     .build();
/// installer.interrupt().listen_for_ctrl_c();
/// let report = installer.install().await?;
/// println!("{}", report.redirect_url);
/// ```
pub struct RecipeInstallerBuilder {
    context: InstallerContext,
    profile: Option<Profile>,
    telemetry: Arc<dyn TelemetryClient>,
    discoverer: Option<Arc<dyn Discoverer>>,
    fetcher: Option<Arc<dyn RecipeFetcher>>,
    requirement_check: Option<Arc<dyn RequirementCheck>>,
    executor: Option<Arc<dyn RecipeExecutor>>,
    validator: Option<Arc<dyn RecipeValidator>>,
    prompter: Option<Arc<dyn Prompter>>,
    subscribers: Vec<Arc<dyn StatusSubscriber>>,
    link_config: SuccessLinkConfig,
    retry_policy: RetryPolicy,
    execution_options: ExecutionOptions,
    interrupt: Option<Interrupt>,
}

impl RecipeInstallerBuilder {
    /// Replace the host discoverer.
    pub fn with_discoverer(mut self, discoverer: Arc<dyn Discoverer>) -> Self {
        self.discoverer = Some(discoverer);
        self
    }

    /// Replace the recipe fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn RecipeFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the discovery-requirement evaluator.
    pub fn with_requirement_check(mut self, check: Arc<dyn RequirementCheck>) -> Self {
        self.requirement_check = Some(check);
        self
    }

    /// Replace the recipe executor.
    pub fn with_executor(mut self, executor: Arc<dyn RecipeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Replace the recipe validator.
    pub fn with_validator(mut self, validator: Arc<dyn RecipeValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Replace the prompter.
    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Register an additional status subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn StatusSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Forward lifecycle events to the remote install-events sink.
    pub fn with_events_client(self, client: Arc<dyn InstallEventsClient>) -> Self {
        let reporter = Arc::new(InstallEventsReporter::new(client));
        self.with_subscriber(reporter)
    }

    /// Configure the post-install success link.
    pub fn with_success_link(mut self, config: SuccessLinkConfig) -> Self {
        self.link_config = config;
        self
    }

    /// Configure the validator's poll interval and attempt budget.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Configure execution limits.
    pub fn with_execution_options(mut self, options: ExecutionOptions) -> Self {
        self.execution_options = options;
        self
    }

    /// Use an externally created interrupt handle.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Assemble the installer, filling unset collaborators with production
    /// implementations.
    pub fn build(self) -> RecipeInstaller {
        let filter = RecipeFilter::new(
            self.context.clone(),
            self.requirement_check
                .unwrap_or_else(|| Arc::new(ShellRequirementCheck)),
        );
        let fetcher = self.fetcher.unwrap_or_else(|| {
            Arc::new(RecipeFileFetcher::new(
                self.context.recipe_paths.clone(),
                self.context.local_recipes.clone(),
            ))
        });
        let validator = self.validator.unwrap_or_else(|| {
            Arc::new(PollingRecipeValidator::new(
                self.telemetry.clone(),
                self.retry_policy.clone(),
            ))
        });

        RecipeInstaller {
            context: self.context,
            discoverer: self
                .discoverer
                .unwrap_or_else(|| Arc::new(ProcessDiscoverer)),
            fetcher,
            filter,
            executor: self
                .executor
                .unwrap_or_else(|| Arc::new(ShellRecipeExecutor::new(self.execution_options))),
            validator,
            prompter: self.prompter.unwrap_or_else(|| Arc::new(TerminalPrompter)),
            var_provider: RecipeVarProvider::new(self.profile.clone()),
            status: Arc::new(StatusRollup::new(self.subscribers)),
            link_generator: PlatformLinkGenerator::new(self.link_config, self.profile),
            interrupt: self.interrupt.unwrap_or_default(),
        }
    }
}

/// Orchestrates one installation run end to end.
pub struct RecipeInstaller {
    context: InstallerContext,
    discoverer: Arc<dyn Discoverer>,
    fetcher: Arc<dyn RecipeFetcher>,
    filter: RecipeFilter,
    executor: Arc<dyn RecipeExecutor>,
    validator: Arc<dyn RecipeValidator>,
    prompter: Arc<dyn Prompter>,
    var_provider: RecipeVarProvider,
    status: Arc<StatusRollup>,
    link_generator: PlatformLinkGenerator,
    interrupt: Interrupt,
}

impl RecipeInstaller {
    /// Start assembling an installer for one run.
    ///
    /// The default subscriber set contains the terminal reporter; use the
    /// builder to add more or wire the remote events sink.
    pub fn builder(
        context: InstallerContext,
        profile: Option<Profile>,
        telemetry: Arc<dyn TelemetryClient>,
    ) -> RecipeInstallerBuilder {
        RecipeInstallerBuilder {
            context,
            profile,
            telemetry,
            discoverer: None,
            fetcher: None,
            requirement_check: None,
            executor: None,
            validator: None,
            prompter: None,
            subscribers: vec![Arc::new(TerminalStatusReporter::new())],
            link_config: SuccessLinkConfig::default(),
            retry_policy: RetryPolicy::default(),
            execution_options: ExecutionOptions::default(),
            interrupt: None,
        }
    }

    /// The run's interrupt handle, for signal wiring.
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// The run's status aggregator.
    pub fn status(&self) -> &Arc<StatusRollup> {
        &self.status
    }

    /// Run the installation pipeline to completion.
    ///
    /// Per-recipe failures are absorbed into status; only fatal-to-run
    /// errors and [`InstallError::Interrupted`] are returned.
    pub async fn install(&self) -> Result<InstallReport, InstallError> {
        match self.run_pipeline().await {
            Ok(report) => Ok(report),
            Err(e) if e.is_interrupt() => {
                self.status.install_canceled().await;
                Err(InstallError::Interrupted)
            }
            Err(e) => Err(e),
        }
    }

    async fn run_pipeline(&self) -> Result<InstallReport, InstallError> {
        let manifest = self.discoverer.discover().await?;
        self.status.discovery_complete().await;
        self.checkpoint()?;

        let recipes = self.fetcher.fetch_recipes().await?;
        let outcome = self.filter.filter(&manifest, &recipes).await;
        self.checkpoint()?;

        for recipe in &outcome.skipped {
            self.status.recipe_skipped(recipe).await;
        }
        for recipe in &outcome.retained {
            self.status.recipe_available(recipe).await;
        }
        self.status.recipes_available(&outcome.retained).await;

        if outcome.retained.is_empty() {
            tracing::debug!("no applicable recipes for this host");
            return self.finalize().await;
        }

        let selected = self.select_recipes(&outcome.retained).await?;
        self.status.recipes_selected(&selected).await;

        let mut validations = Vec::new();
        for recipe in &selected {
            self.checkpoint()?;
            self.status.recipe_installing(recipe).await;

            let vars = self.var_provider.prepare(&manifest, recipe);
            match self.executor.execute(recipe, &vars, &self.interrupt).await {
                Ok(()) => validations.push(self.spawn_validation(recipe.clone())),
                Err(InstallError::Interrupted) => return Err(InstallError::Interrupted),
                Err(e) => {
                    tracing::warn!(recipe = %recipe.name, error = %e, "recipe execution failed");
                    self.status.recipe_failed(recipe, &e).await;
                }
            }
        }

        // Validation polling overlaps the executions above; wait for the
        // stragglers before concluding the run.
        for result in join_all(validations).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "validation task aborted");
            }
        }
        self.checkpoint()?;

        self.finalize().await
    }

    /// Confirm or narrow the retained recipes with the user.
    async fn select_recipes(&self, retained: &[Recipe]) -> Result<Vec<Recipe>, InstallError> {
        if self.context.assume_yes || self.context.is_targeted() {
            return Ok(retained.to_vec());
        }

        for recipe in retained {
            self.status.recipe_recommended(recipe).await;
        }

        if retained.len() == 1 {
            let recipe = &retained[0];
            let mut message = format!("Install {}?", recipe.display_name());
            if let Some(info) = &recipe.pre_install.info {
                message = format!("{}\n{}", info.trim(), message);
            }
            return if self.prompter.confirm(&message, true)? {
                Ok(retained.to_vec())
            } else {
                Err(InstallError::Interrupted)
            };
        }

        let items: Vec<String> = retained
            .iter()
            .map(|r| r.display_name().to_string())
            .collect();
        let chosen = self
            .prompter
            .multi_select("Select the recipes to install", &items)?;

        let mut selected = Vec::with_capacity(chosen.len());
        for (index, recipe) in retained.iter().enumerate() {
            if chosen.contains(&index) {
                selected.push(recipe.clone());
            } else {
                self.status.recipe_skipped(recipe).await;
            }
        }
        Ok(selected)
    }

    fn spawn_validation(&self, recipe: Recipe) -> tokio::task::JoinHandle<()> {
        let validator = self.validator.clone();
        let status = self.status.clone();
        let interrupt = self.interrupt.clone();
        tokio::spawn(async move {
            match validator.validate(&recipe, &interrupt).await {
                Ok(entity_guid) => status.recipe_installed(&recipe, entity_guid).await,
                Err(InstallError::Interrupted) => {
                    // The canceled rollup entry point settles this recipe.
                    tracing::debug!(recipe = %recipe.name, "validation interrupted");
                }
                Err(e) => status.recipe_failed(&recipe, &e).await,
            }
        })
    }

    async fn finalize(&self) -> Result<InstallReport, InstallError> {
        self.status.install_complete().await;
        let status = self.status.snapshot().await;
        let redirect_url = self.link_generator.generate_redirect_url(&status);
        Ok(InstallReport {
            status,
            redirect_url,
        })
    }

    fn checkpoint(&self) -> Result<(), InstallError> {
        if self.interrupt.is_triggered() {
            Err(InstallError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryManifest;
    use crate::status::RecipeStatus;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct EmptyDiscoverer;

    #[async_trait]
    impl Discoverer for EmptyDiscoverer {
        async fn discover(&self) -> Result<DiscoveryManifest, InstallError> {
            Ok(DiscoveryManifest::default())
        }
    }

    struct StaticFetcher(Vec<Recipe>);

    #[async_trait]
    impl RecipeFetcher for StaticFetcher {
        async fn fetch_recipes(&self) -> Result<Vec<Recipe>, InstallError> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl RecipeFetcher for FailingFetcher {
        async fn fetch_recipes(&self) -> Result<Vec<Recipe>, InstallError> {
            Err(InstallError::FetchFailed {
                message: "503".to_string(),
            })
        }
    }

    struct CountingTelemetry {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TelemetryClient for CountingTelemetry {
        async fn query(&self, _query: &str) -> Result<Vec<Value>, InstallError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![json!({ "count": 1.0 })])
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl RecipeExecutor for FailingExecutor {
        async fn execute(
            &self,
            recipe: &Recipe,
            _vars: &HashMap<String, String>,
            _interrupt: &Interrupt,
        ) -> Result<(), InstallError> {
            Err(InstallError::ExecutionFailed {
                recipe: recipe.name.clone(),
                message: "scripted failure".to_string(),
                exit_code: Some(1),
                stderr: None,
            })
        }
    }

    fn recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            install: "true".to_string(),
            validation_query: Some("SELECT count(*) FROM Sample".to_string()),
            ..Default::default()
        }
    }

    fn builder_with(recipes: Vec<Recipe>) -> RecipeInstallerBuilder {
        let context = InstallerContext {
            assume_yes: true,
            ..Default::default()
        };
        RecipeInstaller::builder(
            context,
            None,
            Arc::new(CountingTelemetry {
                calls: AtomicU32::new(0),
            }),
        )
        .with_discoverer(Arc::new(EmptyDiscoverer))
        .with_fetcher(Arc::new(StaticFetcher(recipes)))
    }

    #[tokio::test]
    async fn test_install_runs_both_recipes() {
        let installer = builder_with(vec![recipe("a"), recipe("b")]).build();
        let report = installer.install().await.unwrap();

        assert_eq!(report.status.recipes.len(), 2);
        assert!(report
            .status
            .recipes
            .iter()
            .all(|r| r.status == Some(RecipeStatus::Installed)));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let installer = builder_with(Vec::new())
            .with_fetcher(Arc::new(FailingFetcher))
            .build();

        let result = installer.install().await;
        assert!(matches!(result, Err(InstallError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_execution_failure_does_not_abort_run() {
        let installer = builder_with(vec![recipe("a"), recipe("b")])
            .with_executor(Arc::new(FailingExecutor))
            .build();

        let report = installer.install().await.unwrap();
        assert!(report
            .status
            .recipes
            .iter()
            .all(|r| r.status == Some(RecipeStatus::Failed)));
        assert_eq!(report.redirect_url, "");
    }

    #[tokio::test]
    async fn test_all_recipes_skipped_completes_without_link() {
        let context = InstallerContext {
            assume_yes: true,
            skip_integrations: true,
            ..Default::default()
        };
        let installer = RecipeInstaller::builder(
            context,
            None,
            Arc::new(CountingTelemetry {
                calls: AtomicU32::new(0),
            }),
        )
        .with_discoverer(Arc::new(EmptyDiscoverer))
        .with_fetcher(Arc::new(StaticFetcher(vec![recipe("integration-recipe")])))
        .build();

        let report = installer.install().await.unwrap();
        assert_eq!(report.redirect_url, "");
        assert!(report
            .status
            .recipes
            .iter()
            .all(|r| r.status == Some(RecipeStatus::Skipped)));
    }

    #[tokio::test]
    async fn test_pre_triggered_interrupt_cancels_run() {
        let interrupt = Interrupt::new();
        interrupt.trigger();

        let installer = builder_with(vec![recipe("a")])
            .with_interrupt(interrupt)
            .build();

        let result = installer.install().await;
        assert!(matches!(result, Err(InstallError::Interrupted)));
    }
}
