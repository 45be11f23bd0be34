//! Interactive prompt surface.
//!
//! The orchestrator only ever asks two things: yes/no confirmation and a
//! pick-from-list selection. Both sit behind [`Prompter`] so guided runs,
//! `--assumeYes` runs, and tests all drive the same code path.

use dialoguer::{Confirm, MultiSelect};

use crate::error::InstallError;

/// Interactive questions the orchestrator can ask.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question.
    fn confirm(&self, message: &str, default: bool) -> Result<bool, InstallError>;

    /// Ask the user to pick any subset of `items`; returns selected indexes.
    fn multi_select(&self, message: &str, items: &[String]) -> Result<Vec<usize>, InstallError>;
}

/// Terminal prompter backed by `dialoguer`.
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, InstallError> {
        Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            // An aborted prompt (Ctrl-C / closed tty) reads as cancellation.
            .map_err(|_| InstallError::Interrupted)
    }

    fn multi_select(&self, message: &str, items: &[String]) -> Result<Vec<usize>, InstallError> {
        MultiSelect::new()
            .with_prompt(message)
            .items(items)
            .interact()
            .map_err(|_| InstallError::Interrupted)
    }
}
