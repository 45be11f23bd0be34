//! Recipe catalog: data model, fetching, and applicability filtering.
//!
//! A run fetches its candidate catalog once (remote service or local file
//! override), then filters it against the discovery manifest and the user's
//! explicit selections before anything is executed.

mod fetcher;
mod filter;
mod types;

pub use fetcher::{RecipeFetcher, RecipeFileFetcher};
pub use filter::{
    partition_by_context, FilterOutcome, RecipeFilter, RequirementCheck, ShellRequirementCheck,
};
pub use types::{
    DiscoveryRequirement, LogMatch, PostInstall, PreInstall, Recipe, RecipeCategory,
    INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME,
};
