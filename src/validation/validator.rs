//! Post-install validation against the telemetry backend.
//!
//! A recipe's executor can exit cleanly while its data has not yet
//! propagated, so "installed" is only confirmed once the recipe's validation
//! query returns results. The validator polls the query under a
//! [`RetryPolicy`] and treats an exhausted budget as a per-recipe failure.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::InstallError;
use crate::interrupt::Interrupt;
use crate::recipe::Recipe;
use crate::validation::{poll_until, PollError, RetryPolicy};

/// Query access to the telemetry backend.
///
/// An empty result set means the installation's data has not landed yet,
/// not that the query failed.
#[async_trait]
pub trait TelemetryClient: Send + Sync {
    /// Run a telemetry query and return its result rows.
    async fn query(&self, query: &str) -> Result<Vec<Value>, InstallError>;
}

/// Confirms a recipe installation produced data.
#[async_trait]
pub trait RecipeValidator: Send + Sync {
    /// Poll until the recipe's validation query returns data.
    ///
    /// Returns the entity GUID reported by the backend when one is present
    /// in the results. Recipes without a validation query pass immediately.
    async fn validate(
        &self,
        recipe: &Recipe,
        interrupt: &Interrupt,
    ) -> Result<Option<String>, InstallError>;
}

/// Polls the recipe's validation query at a fixed interval.
///
/// # Example
///
/// ```rust,ignore
/// let validator = PollingRecipeValidator::new(client, RetryPolicy::default());
/// let guid = validator.validate(&recipe, &interrupt).await?;
/// ```
pub struct PollingRecipeValidator {
    client: Arc<dyn TelemetryClient>,
    policy: RetryPolicy,
}

impl PollingRecipeValidator {
    /// Create a validator over a telemetry client and retry policy.
    pub fn new(client: Arc<dyn TelemetryClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Whether a result set shows telemetry has landed.
    ///
    /// Backends answer count queries with a single zero-count row rather
    /// than no rows, so a `count` of zero still means "nothing yet".
    fn results_landed(rows: &[Value]) -> bool {
        rows.iter().any(|row| {
            match row.get("count").and_then(Value::as_f64) {
                Some(count) => count > 0.0,
                // Non-aggregate rows are data by themselves.
                None => true,
            }
        })
    }

    fn entity_guid(rows: &[Value]) -> Option<String> {
        rows.iter().find_map(|row| {
            row.get("entityGuid")
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        })
    }
}

#[async_trait]
impl RecipeValidator for PollingRecipeValidator {
    async fn validate(
        &self,
        recipe: &Recipe,
        interrupt: &Interrupt,
    ) -> Result<Option<String>, InstallError> {
        let Some(query) = recipe.validation_query.as_deref() else {
            tracing::debug!(recipe = %recipe.name, "no validation query; confirming immediately");
            return Ok(None);
        };

        let outcome = poll_until(&self.policy, interrupt, |attempt| async move {
            match self.client.query(query).await {
                Ok(rows) if Self::results_landed(&rows) => Some(Self::entity_guid(&rows)),
                Ok(_) => {
                    tracing::debug!(recipe = %recipe.name, attempt, "no data yet");
                    None
                }
                Err(e) => {
                    // A transient backend error counts as "not landed yet".
                    tracing::warn!(recipe = %recipe.name, attempt, error = %e, "telemetry query failed");
                    None
                }
            }
        })
        .await;

        match outcome {
            Ok(guid) => Ok(guid),
            Err(PollError::Interrupted) => Err(InstallError::Interrupted),
            Err(PollError::Exhausted { attempts }) => Err(InstallError::ValidationTimeout {
                recipe: recipe.name.clone(),
                attempts,
            }),
        }
    }
}
