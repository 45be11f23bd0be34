//! Status subscriber capability.

use async_trait::async_trait;
use thiserror::Error;

use crate::status::InstallEvent;

/// Failure raised by a subscriber while handling one event.
///
/// Caught at the aggregator's fan-out boundary, logged, and swallowed; it
/// never affects other subscribers or the pipeline.
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// Terminal rendering failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A remote sink rejected or dropped the event.
    #[error("event submission failed: {message}")]
    Submission {
        /// Description of the submission failure.
        message: String,
    },
}

/// Observer of every status transition in a run.
///
/// Implementations render progress, forward events to a remote sink, or
/// record them for tests; the aggregator treats them uniformly and invokes
/// each one exactly once per event, in registration order.
#[async_trait]
pub trait StatusSubscriber: Send + Sync {
    /// Handle one lifecycle event.
    async fn notify(&self, event: &InstallEvent) -> Result<(), SubscriberError>;
}
