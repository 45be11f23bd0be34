//! Recipe lifecycle statuses and the events that carry them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Lifecycle status of one recipe within a run.
///
/// Statuses only move forward: `Available → Recommended → Selected →
/// Installing`, then one of the terminal outcomes. A recipe never leaves a
/// terminal status within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeStatus {
    /// The recipe applies to this host and can be installed.
    Available,
    /// The recipe was recommended for this host but not auto-installed.
    Recommended,
    /// The user selected the recipe for installation.
    Selected,
    /// The install procedure is running or awaiting validation.
    Installing,
    /// Installation confirmed by telemetry.
    Installed,
    /// Execution or validation failed.
    Failed,
    /// Excluded by user flags or declined.
    Skipped,
    /// The run was interrupted before this recipe completed.
    Canceled,
}

impl RecipeStatus {
    /// Whether this status ends the recipe's lifecycle for the run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Installed | Self::Failed | Self::Skipped | Self::Canceled
        )
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Available => 0,
            Self::Recommended => 1,
            Self::Selected => 2,
            Self::Installing => 3,
            Self::Installed | Self::Failed | Self::Skipped | Self::Canceled => 4,
        }
    }

    /// Whether a recipe may move from `self` to `next`.
    ///
    /// Terminal statuses accept no further transitions, and `Installing`
    /// may only be entered from the pre-execution statuses.
    pub fn can_transition_to(&self, next: RecipeStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Installing {
            return matches!(self, Self::Available | Self::Recommended | Self::Selected);
        }
        next.rank() >= self.rank()
    }
}

/// A single observed fact about one recipe.
///
/// Snapshotted by the aggregator at each mutation and handed to every
/// subscriber.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeStatusEvent {
    /// Recipe name.
    pub name: String,
    /// Recipe display name.
    pub display_name: String,
    /// The status the recipe just entered.
    pub status: Option<RecipeStatus>,
    /// Entity GUID produced by validation, when known.
    pub entity_guid: Option<String>,
    /// Error message for failure events.
    pub error_message: Option<String>,
}

/// One lifecycle event of an installation run.
///
/// A tagged union so subscribers can match exhaustively over every kind.
#[derive(Debug, Clone)]
pub enum InstallEvent {
    /// The filtered catalog is known.
    RecipesAvailable {
        /// Per-recipe snapshots for the available set.
        recipes: Vec<RecipeStatusEvent>,
    },
    /// The user's selection is final.
    RecipesSelected {
        /// Per-recipe snapshots for the selected set.
        recipes: Vec<RecipeStatusEvent>,
    },
    /// Host discovery finished.
    DiscoveryComplete,
    /// One recipe became available.
    RecipeAvailable(RecipeStatusEvent),
    /// One recipe was recommended without being auto-installed.
    RecipeRecommended(RecipeStatusEvent),
    /// One recipe's install procedure started.
    RecipeInstalling(RecipeStatusEvent),
    /// One recipe was installed and confirmed.
    RecipeInstalled(RecipeStatusEvent),
    /// One recipe failed to execute or validate.
    RecipeFailed(RecipeStatusEvent),
    /// One recipe was excluded from the run.
    RecipeSkipped(RecipeStatusEvent),
    /// Every selected recipe was processed.
    InstallComplete,
    /// The run was interrupted.
    InstallCanceled,
}

impl InstallEvent {
    /// Stable name of this event kind for payloads and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RecipesAvailable { .. } => "RecipesAvailable",
            Self::RecipesSelected { .. } => "RecipesSelected",
            Self::DiscoveryComplete => "DiscoveryComplete",
            Self::RecipeAvailable(_) => "RecipeAvailable",
            Self::RecipeRecommended(_) => "RecipeRecommended",
            Self::RecipeInstalling(_) => "RecipeInstalling",
            Self::RecipeInstalled(_) => "RecipeInstalled",
            Self::RecipeFailed(_) => "RecipeFailed",
            Self::RecipeSkipped(_) => "RecipeSkipped",
            Self::InstallComplete => "InstallComplete",
            Self::InstallCanceled => "InstallCanceled",
        }
    }

    /// The single-recipe snapshot this event carries, when it has one.
    pub fn recipe(&self) -> Option<&RecipeStatusEvent> {
        match self {
            Self::RecipeAvailable(e)
            | Self::RecipeRecommended(e)
            | Self::RecipeInstalling(e)
            | Self::RecipeInstalled(e)
            | Self::RecipeFailed(e)
            | Self::RecipeSkipped(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_terminal_statuses() {
        assert!(RecipeStatus::Installed.is_terminal());
        assert!(RecipeStatus::Failed.is_terminal());
        assert!(RecipeStatus::Skipped.is_terminal());
        assert!(RecipeStatus::Canceled.is_terminal());
        assert!(!RecipeStatus::Available.is_terminal());
        assert!(!RecipeStatus::Installing.is_terminal());
    }

    #[test]
    fn test_no_transition_out_of_terminal() {
        for terminal in [
            RecipeStatus::Installed,
            RecipeStatus::Failed,
            RecipeStatus::Skipped,
            RecipeStatus::Canceled,
        ] {
            for next in RecipeStatus::iter() {
                assert!(
                    !terminal.can_transition_to(next),
                    "{terminal} should not transition to {next}"
                );
            }
        }
    }

    #[test]
    fn test_installing_entered_only_from_pre_execution() {
        assert!(RecipeStatus::Available.can_transition_to(RecipeStatus::Installing));
        assert!(RecipeStatus::Recommended.can_transition_to(RecipeStatus::Installing));
        assert!(RecipeStatus::Selected.can_transition_to(RecipeStatus::Installing));
        assert!(!RecipeStatus::Installing.can_transition_to(RecipeStatus::Installing));
    }

    #[test]
    fn test_forward_transitions() {
        assert!(RecipeStatus::Available.can_transition_to(RecipeStatus::Selected));
        assert!(RecipeStatus::Installing.can_transition_to(RecipeStatus::Installed));
        assert!(RecipeStatus::Installing.can_transition_to(RecipeStatus::Failed));
        assert!(RecipeStatus::Available.can_transition_to(RecipeStatus::Skipped));
        // No regressions.
        assert!(!RecipeStatus::Selected.can_transition_to(RecipeStatus::Available));
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&RecipeStatus::Installing).unwrap();
        assert_eq!(json, "\"INSTALLING\"");
        assert_eq!(RecipeStatus::Installed.to_string(), "INSTALLED");
    }

    #[test]
    fn test_event_kind_and_recipe_accessors() {
        let snapshot = RecipeStatusEvent {
            name: "logs-integration".to_string(),
            ..Default::default()
        };
        let event = InstallEvent::RecipeInstalling(snapshot);
        assert_eq!(event.kind(), "RecipeInstalling");
        assert_eq!(event.recipe().unwrap().name, "logs-integration");

        assert_eq!(InstallEvent::InstallComplete.kind(), "InstallComplete");
        assert!(InstallEvent::InstallComplete.recipe().is_none());
    }
}
