//! Terminal progress reporter.

use async_trait::async_trait;
use console::{style, Term};

use crate::status::{InstallEvent, StatusSubscriber, SubscriberError};

/// Renders lifecycle events to the terminal.
///
/// Writes to stderr so the redirect URL printed by the caller stays the
/// only stdout output of a run.
pub struct TerminalStatusReporter {
    term: Term,
}

impl TerminalStatusReporter {
    /// Create a reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn write(&self, line: &str) -> Result<(), SubscriberError> {
        self.term.write_line(line)?;
        Ok(())
    }
}

impl Default for TerminalStatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusSubscriber for TerminalStatusReporter {
    async fn notify(&self, event: &InstallEvent) -> Result<(), SubscriberError> {
        match event {
            InstallEvent::DiscoveryComplete => self.write("Host discovery complete."),
            InstallEvent::RecipesAvailable { recipes } => {
                self.write(&format!(
                    "Found {} recipe(s) for this host:",
                    recipes.len()
                ))?;
                for recipe in recipes {
                    self.write(&format!("  - {}", recipe.display_name))?;
                }
                Ok(())
            }
            InstallEvent::RecipesSelected { recipes } => {
                self.write(&format!("Installing {} recipe(s).", recipes.len()))
            }
            InstallEvent::RecipeAvailable(_) | InstallEvent::RecipeRecommended(_) => Ok(()),
            InstallEvent::RecipeInstalling(e) => self.write(&format!(
                "{} Installing {}...",
                style("==>").cyan(),
                e.display_name
            )),
            InstallEvent::RecipeInstalled(e) => self.write(&format!(
                "{} {} installed.",
                style("✔").green(),
                e.display_name
            )),
            InstallEvent::RecipeFailed(e) => {
                let reason = e.error_message.as_deref().unwrap_or("unknown error");
                self.write(&format!(
                    "{} {} failed: {}",
                    style("✘").red(),
                    e.display_name,
                    reason
                ))
            }
            InstallEvent::RecipeSkipped(e) => self.write(&format!(
                "{} {} skipped.",
                style("-").dim(),
                e.display_name
            )),
            InstallEvent::InstallComplete => self.write(&format!(
                "{}",
                style("Installation complete.").bold()
            )),
            InstallEvent::InstallCanceled => self.write(&format!(
                "{}",
                style("Installation canceled.").yellow()
            )),
        }
    }
}
