//! # observa-install
//!
//! Guided installation orchestrator for Observa telemetry agents.
//!
//! This crate drives one installation run end to end: it discovers what is
//! running on the host, fetches and filters the recipe catalog, executes the
//! selected install procedures, confirms each installation against the
//! telemetry backend, and produces a link to the installed data. Every
//! collaborator (discoverer, fetcher, executor, validator, prompter, status
//! subscribers) sits behind a narrow trait so embedders and tests assemble
//! the same orchestrator from different parts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use observa_install::{InstallError, InstallerContext, RecipeInstaller, TelemetryClient};
//!
//! struct PlatformClient;
//!
//! #[async_trait::async_trait]
//! impl TelemetryClient for PlatformClient {
//!     async fn query(&self, query: &str) -> Result<Vec<serde_json::Value>, InstallError> {
//!         // Call the platform's query endpoint here.
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), InstallError> {
//!     let context = InstallerContext {
//!         assume_yes: true,
//!         ..Default::default()
//!     };
//!     let installer =
//!         RecipeInstaller::builder(context, None, Arc::new(PlatformClient)).build();
//!     installer.interrupt().listen_for_ctrl_c();
//!
//!     match installer.install().await {
//!         Ok(report) => {
//!             if !report.redirect_url.is_empty() {
//!                 println!("See your data at {}", report.redirect_url);
//!             }
//!             Ok(())
//!         }
//!         Err(e) if e.is_interrupt() => Ok(()),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

mod config;
mod discovery;
mod error;
mod execution;
mod installer;
mod interrupt;
mod recipe;
mod status;
mod ux;
mod validation;

pub use config::{InstallerContext, Profile, Region};
pub use discovery::{DiscoveryManifest, Discoverer, ProcessDiscoverer};
pub use error::InstallError;
pub use execution::{ExecutionOptions, RecipeExecutor, RecipeVarProvider, ShellRecipeExecutor};
pub use installer::{InstallReport, RecipeInstaller, RecipeInstallerBuilder};
pub use interrupt::Interrupt;
pub use recipe::{
    partition_by_context, DiscoveryRequirement, FilterOutcome, LogMatch, PostInstall, PreInstall,
    Recipe, RecipeCategory, RecipeFetcher, RecipeFileFetcher, RecipeFilter, RequirementCheck,
    ShellRequirementCheck, INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME,
};
pub use status::{
    InstallEvent, InstallEventPayload, InstallEventsClient, InstallEventsReporter,
    InstallStatusSnapshot, PlatformLinkGenerator, RecipeStatus, RecipeStatusEvent, StatusRollup,
    StatusSubscriber, SubscriberError, SuccessLinkConfig, SuccessLinkType,
    TerminalStatusReporter,
};
pub use ux::{Prompter, TerminalPrompter};
pub use validation::{
    poll_until, PollError, PollingRecipeValidator, RecipeValidator, RetryPolicy, TelemetryClient,
};
