//! Recipe execution.
//!
//! Install procedures are opaque shell scripts. The executor runs one with
//! its variable set in the environment, bounded by a timeout and racing the
//! run-wide interrupt; exit status is all it judges. Telemetry confirmation
//! is the validator's job.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::InstallError;
use crate::interrupt::Interrupt;
use crate::recipe::Recipe;

/// Options for recipe execution.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Maximum time one install procedure may run.
    ///
    /// Default: 5 minutes.
    pub timeout: Duration,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
        }
    }
}

/// Runs a recipe's install procedure.
#[async_trait]
pub trait RecipeExecutor: Send + Sync {
    /// Execute the recipe with the given variable set.
    async fn execute(
        &self,
        recipe: &Recipe,
        vars: &HashMap<String, String>,
        interrupt: &Interrupt,
    ) -> Result<(), InstallError>;
}

/// Executes install procedures through the shell.
///
/// # Example
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use observa_install::{
///     ExecutionOptions, Interrupt, Recipe, RecipeExecutor, ShellRecipeExecutor,
/// };
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let recipe = Recipe {
///         name: "demo".to_string(),
///         install: "echo installing".to_string(),
///         ..Default::default()
///     };
///     let executor = ShellRecipeExecutor::new(ExecutionOptions::default());
///     executor
///         .execute(&recipe, &HashMap::new(), &Interrupt::new())
///         .await
///         .unwrap();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShellRecipeExecutor {
    options: ExecutionOptions,
}

impl ShellRecipeExecutor {
    /// Create an executor with the given options.
    pub fn new(options: ExecutionOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl RecipeExecutor for ShellRecipeExecutor {
    async fn execute(
        &self,
        recipe: &Recipe,
        vars: &HashMap<String, String>,
        interrupt: &Interrupt,
    ) -> Result<(), InstallError> {
        if recipe.install.trim().is_empty() {
            return Err(InstallError::ExecutionFailed {
                recipe: recipe.name.clone(),
                message: "recipe has no install procedure".to_string(),
                exit_code: None,
                stderr: None,
            });
        }

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&recipe.install)
            .envs(vars)
            .kill_on_drop(true)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(recipe = %recipe.name, "executing install procedure");

        let output = tokio::select! {
            _ = interrupt.cancelled() => return Err(InstallError::Interrupted),
            result = timeout(self.options.timeout, command.output()) => match result {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    return Err(InstallError::ExecutionFailed {
                        recipe: recipe.name.clone(),
                        message: format!("could not run install procedure: {e}"),
                        exit_code: None,
                        stderr: None,
                    });
                }
                Err(_) => {
                    return Err(InstallError::ExecutionTimeout {
                        recipe: recipe.name.clone(),
                        duration: self.options.timeout,
                    });
                }
            },
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(InstallError::ExecutionFailed {
                recipe: recipe.name.clone(),
                message: format!(
                    "install procedure exited with code {:?}",
                    output.status.code()
                ),
                exit_code: output.status.code(),
                stderr: (!stderr.is_empty()).then_some(stderr),
            });
        }

        Ok(())
    }
}
