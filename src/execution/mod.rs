//! Recipe execution: the shell executor and its variable provider.

mod executor;
mod variables;

pub use executor::{ExecutionOptions, RecipeExecutor, ShellRecipeExecutor};
pub use variables::RecipeVarProvider;
