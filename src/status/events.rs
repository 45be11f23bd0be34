//! Remote install-events reporter.
//!
//! Forwards every lifecycle event to the platform's install-events sink so
//! guided installs can be analyzed server-side. Submission is
//! fire-and-forget: a failed submission is surfaced as a subscriber error,
//! which the aggregator logs and swallows.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::status::{InstallEvent, RecipeStatus, StatusSubscriber, SubscriberError};

/// Outbound payload for one lifecycle event.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstallEventPayload {
    /// Event kind (e.g. "RecipeInstalled").
    pub event_type: String,
    /// Recipe the event concerns, for per-recipe events.
    pub recipe_name: Option<String>,
    /// Status the recipe entered, for per-recipe events.
    pub status: Option<RecipeStatus>,
    /// Entity GUID reported by validation, when known.
    pub entity_guid: Option<String>,
    /// Error message for failure events.
    pub error_message: Option<String>,
}

impl InstallEventPayload {
    /// Build the payload for one lifecycle event.
    pub fn from_event(event: &InstallEvent) -> Self {
        let recipe = event.recipe();
        Self {
            event_type: event.kind().to_string(),
            recipe_name: recipe.map(|r| r.name.clone()),
            status: recipe.and_then(|r| r.status),
            entity_guid: recipe.and_then(|r| r.entity_guid.clone()),
            error_message: recipe.and_then(|r| r.error_message.clone()),
        }
    }
}

/// Transport for the install-events sink.
///
/// The platform client lives outside this crate; tests substitute a
/// recording implementation.
#[async_trait]
pub trait InstallEventsClient: Send + Sync {
    /// Submit one install event.
    async fn create_install_event(&self, payload: &InstallEventPayload)
        -> Result<(), SubscriberError>;
}

/// Subscriber that forwards every event to the install-events sink.
pub struct InstallEventsReporter {
    client: Arc<dyn InstallEventsClient>,
}

impl InstallEventsReporter {
    /// Create a reporter over an events client.
    pub fn new(client: Arc<dyn InstallEventsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusSubscriber for InstallEventsReporter {
    async fn notify(&self, event: &InstallEvent) -> Result<(), SubscriberError> {
        let payload = InstallEventPayload::from_event(event);
        self.client.create_install_event(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::RecipeStatusEvent;
    use std::sync::Mutex;

    struct RecordingClient {
        payloads: Mutex<Vec<InstallEventPayload>>,
    }

    impl RecordingClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                payloads: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InstallEventsClient for RecordingClient {
        async fn create_install_event(
            &self,
            payload: &InstallEventPayload,
        ) -> Result<(), SubscriberError> {
            self.payloads.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reporter_submits_one_payload_per_event() {
        let client = RecordingClient::new();
        let reporter = InstallEventsReporter::new(client.clone());

        reporter
            .notify(&InstallEvent::DiscoveryComplete)
            .await
            .unwrap();
        reporter.notify(&InstallEvent::InstallComplete).await.unwrap();

        let payloads = client.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].event_type, "DiscoveryComplete");
        assert_eq!(payloads[1].event_type, "InstallComplete");
    }

    #[tokio::test]
    async fn test_payload_carries_recipe_details() {
        let client = RecordingClient::new();
        let reporter = InstallEventsReporter::new(client.clone());

        let event = InstallEvent::RecipeInstalled(RecipeStatusEvent {
            name: "infrastructure-agent-installer".to_string(),
            display_name: "Infrastructure Agent".to_string(),
            status: Some(RecipeStatus::Installed),
            entity_guid: Some("HOST-GUID".to_string()),
            error_message: None,
        });
        reporter.notify(&event).await.unwrap();

        let payloads = client.payloads.lock().unwrap();
        assert_eq!(
            payloads[0].recipe_name.as_deref(),
            Some("infrastructure-agent-installer")
        );
        assert_eq!(payloads[0].status, Some(RecipeStatus::Installed));
        assert_eq!(payloads[0].entity_guid.as_deref(), Some("HOST-GUID"));
    }

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = InstallEventPayload {
            event_type: "RecipeFailed".to_string(),
            recipe_name: Some("logs-integration".to_string()),
            status: Some(RecipeStatus::Failed),
            entity_guid: None,
            error_message: Some("exit 1".to_string()),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"eventType\""));
        assert!(json.contains("\"recipeName\""));
        assert!(json.contains("\"FAILED\""));
    }
}
