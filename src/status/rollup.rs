//! The install status aggregator.
//!
//! [`StatusRollup`] is the single source of truth for per-recipe lifecycle
//! state during a run. Every pipeline stage mutates state through one of its
//! entry points; each entry point applies the transition under one mutex,
//! snapshots an event, and fans it out to every subscriber in registration
//! order. Rejected transitions (regressions from a terminal status) are
//! deterministic no-ops and fire no event.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::InstallError;
use crate::recipe::{Recipe, INFRA_AGENT_RECIPE_NAME};
use crate::status::{InstallEvent, RecipeStatus, RecipeStatusEvent, StatusSubscriber};

#[derive(Debug, Clone)]
struct RecipeRecord {
    name: String,
    display_name: String,
    status: RecipeStatus,
    entity_guid: Option<String>,
}

#[derive(Default)]
struct RollupInner {
    // Insertion-ordered so reports render recipes in pipeline order.
    records: Vec<RecipeRecord>,
    host_entity_guid: Option<String>,
}

impl RollupInner {
    /// Apply a transition, returning the post-transition snapshot, or
    /// `None` when the transition is rejected.
    fn apply(&mut self, recipe: &Recipe, next: RecipeStatus) -> Option<RecipeStatusEvent> {
        match self.records.iter_mut().find(|r| r.name == recipe.name) {
            Some(record) => {
                if !record.status.can_transition_to(next) {
                    tracing::debug!(
                        recipe = %record.name,
                        from = %record.status,
                        to = %next,
                        "ignoring status regression"
                    );
                    return None;
                }
                record.status = next;
                Some(snapshot(record))
            }
            None => {
                let record = RecipeRecord {
                    name: recipe.name.clone(),
                    display_name: recipe.display_name().to_string(),
                    status: next,
                    entity_guid: None,
                };
                let event = snapshot(&record);
                self.records.push(record);
                Some(event)
            }
        }
    }
}

fn snapshot(record: &RecipeRecord) -> RecipeStatusEvent {
    RecipeStatusEvent {
        name: record.name.clone(),
        display_name: record.display_name.clone(),
        status: Some(record.status),
        entity_guid: record.entity_guid.clone(),
        error_message: None,
    }
}

/// Read-only view of the aggregate state, taken at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct InstallStatusSnapshot {
    /// Final per-recipe snapshots, in pipeline order.
    pub recipes: Vec<RecipeStatusEvent>,
    /// Entity GUID of the host-level recipe, when validation reported one.
    pub host_entity_guid: Option<String>,
}

impl InstallStatusSnapshot {
    /// Whether any recipe ended the run in the given status.
    pub fn has_any_recipe_status(&self, status: RecipeStatus) -> bool {
        self.recipes.iter().any(|r| r.status == Some(status))
    }
}

/// Holds the authoritative status of every recipe across one run and fans
/// every transition out to the registered subscribers.
///
/// One rollup is constructed per run and discarded when the run ends; there
/// is no cross-run state.
pub struct StatusRollup {
    subscribers: Vec<Arc<dyn StatusSubscriber>>,
    inner: Mutex<RollupInner>,
}

impl StatusRollup {
    /// Create a rollup fanning out to the given subscribers.
    pub fn new(subscribers: Vec<Arc<dyn StatusSubscriber>>) -> Self {
        Self {
            subscribers,
            inner: Mutex::new(RollupInner::default()),
        }
    }

    /// Deliver one event to every subscriber, exactly once each.
    ///
    /// A subscriber failure is logged and swallowed so the remaining
    /// subscribers still observe the event.
    async fn fire(&self, event: InstallEvent) {
        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.notify(&event).await {
                tracing::warn!(kind = event.kind(), error = %e, "status subscriber failed");
            }
        }
    }

    /// Host discovery finished.
    pub async fn discovery_complete(&self) {
        let _guard = self.inner.lock().await;
        self.fire(InstallEvent::DiscoveryComplete).await;
    }

    /// One recipe passed filtering and is available for install.
    pub async fn recipe_available(&self, recipe: &Recipe) {
        let mut inner = self.inner.lock().await;
        if let Some(event) = inner.apply(recipe, RecipeStatus::Available) {
            self.fire(InstallEvent::RecipeAvailable(event)).await;
        }
    }

    /// One recipe was recommended without being auto-installed.
    pub async fn recipe_recommended(&self, recipe: &Recipe) {
        let mut inner = self.inner.lock().await;
        if let Some(event) = inner.apply(recipe, RecipeStatus::Recommended) {
            self.fire(InstallEvent::RecipeRecommended(event)).await;
        }
    }

    /// The filtered catalog is final.
    pub async fn recipes_available(&self, recipes: &[Recipe]) {
        let mut inner = self.inner.lock().await;
        let mut events = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            if let Some(event) = inner.apply(recipe, RecipeStatus::Available) {
                events.push(event);
            }
        }
        self.fire(InstallEvent::RecipesAvailable { recipes: events })
            .await;
    }

    /// The user's selection is final.
    pub async fn recipes_selected(&self, recipes: &[Recipe]) {
        let mut inner = self.inner.lock().await;
        let mut events = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            if let Some(event) = inner.apply(recipe, RecipeStatus::Selected) {
                events.push(event);
            }
        }
        self.fire(InstallEvent::RecipesSelected { recipes: events })
            .await;
    }

    /// One recipe's install procedure started.
    pub async fn recipe_installing(&self, recipe: &Recipe) {
        let mut inner = self.inner.lock().await;
        if let Some(event) = inner.apply(recipe, RecipeStatus::Installing) {
            self.fire(InstallEvent::RecipeInstalling(event)).await;
        }
    }

    /// One recipe was installed and confirmed by telemetry.
    ///
    /// Records the entity GUID reported by validation; the GUID of the
    /// host-level recipe becomes the run's host entity GUID.
    pub async fn recipe_installed(&self, recipe: &Recipe, entity_guid: Option<String>) {
        let mut inner = self.inner.lock().await;
        if let Some(mut event) = inner.apply(recipe, RecipeStatus::Installed) {
            if recipe.name == INFRA_AGENT_RECIPE_NAME && entity_guid.is_some() {
                inner.host_entity_guid = entity_guid.clone();
            }
            if let Some(record) = inner.records.iter_mut().find(|r| r.name == recipe.name) {
                record.entity_guid = entity_guid.clone();
            }
            event.entity_guid = entity_guid;
            self.fire(InstallEvent::RecipeInstalled(event)).await;
        }
    }

    /// One recipe failed to execute or validate; the run continues.
    pub async fn recipe_failed(&self, recipe: &Recipe, error: &InstallError) {
        let mut inner = self.inner.lock().await;
        if let Some(mut event) = inner.apply(recipe, RecipeStatus::Failed) {
            event.error_message = Some(error.to_string());
            self.fire(InstallEvent::RecipeFailed(event)).await;
        }
    }

    /// One recipe was excluded from the run.
    pub async fn recipe_skipped(&self, recipe: &Recipe) {
        let mut inner = self.inner.lock().await;
        if let Some(event) = inner.apply(recipe, RecipeStatus::Skipped) {
            self.fire(InstallEvent::RecipeSkipped(event)).await;
        }
    }

    /// Every selected recipe was processed.
    pub async fn install_complete(&self) {
        let _guard = self.inner.lock().await;
        self.fire(InstallEvent::InstallComplete).await;
    }

    /// The run was interrupted; recipes still in flight become `Canceled`.
    pub async fn install_canceled(&self) {
        let mut inner = self.inner.lock().await;
        for record in &mut inner.records {
            if !record.status.is_terminal() {
                record.status = RecipeStatus::Canceled;
            }
        }
        self.fire(InstallEvent::InstallCanceled).await;
    }

    /// Whether any recipe currently has the given status.
    pub async fn has_any_recipe_status(&self, status: RecipeStatus) -> bool {
        let inner = self.inner.lock().await;
        inner.records.iter().any(|r| r.status == status)
    }

    /// Entity GUID of the host-level recipe, when validation reported one.
    pub async fn host_entity_guid(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.host_entity_guid.clone()
    }

    /// Read-only view of the aggregate state.
    pub async fn snapshot(&self) -> InstallStatusSnapshot {
        let inner = self.inner.lock().await;
        InstallStatusSnapshot {
            recipes: inner.records.iter().map(snapshot).collect(),
            host_entity_guid: inner.host_entity_guid.clone(),
        }
    }
}
