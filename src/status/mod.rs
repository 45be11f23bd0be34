//! Install status: the aggregator, its events, and the subscribers that
//! observe them.
//!
//! [`StatusRollup`] is the one piece of mutable state shared across the
//! pipeline's concurrent activity. Everything else here is either an event
//! snapshot flowing out of it or an observer registered with it.

mod event;
mod events;
mod link;
mod rollup;
mod subscriber;
mod terminal;

pub use event::{InstallEvent, RecipeStatus, RecipeStatusEvent};
pub use events::{InstallEventPayload, InstallEventsClient, InstallEventsReporter};
pub use link::{PlatformLinkGenerator, SuccessLinkConfig, SuccessLinkType};
pub use rollup::{InstallStatusSnapshot, StatusRollup};
pub use subscriber::{StatusSubscriber, SubscriberError};
pub use terminal::TerminalStatusReporter;
