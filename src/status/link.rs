//! Post-install success link generation.
//!
//! After a run concludes, the user gets one URL summarizing the outcome:
//! either a filtered entity-explorer view or a deep link to the host entity
//! discovered during validation. No link is produced unless at least one
//! recipe was confirmed installed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::config::{Profile, Region};
use crate::status::{InstallStatusSnapshot, RecipeStatus};

/// Which kind of success link to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SuccessLinkType {
    /// Filtered entity-explorer list.
    Explorer,
    /// Deep link to the host entity.
    #[default]
    Entity,
}

/// Success link configuration, supplied with the run's configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuccessLinkConfig {
    /// The link type to produce.
    #[serde(rename = "type", default)]
    pub link_type: SuccessLinkType,
    /// Entity filter for explorer links.
    #[serde(default)]
    pub filter: String,
}

/// Builds the post-install navigation URL.
///
/// # Example
///
/// ```rust
/// use observa_install::{PlatformLinkGenerator, SuccessLinkConfig, InstallStatusSnapshot};
///
/// let generator = PlatformLinkGenerator::new(SuccessLinkConfig::default(), None);
/// // Nothing installed: no link.
/// assert_eq!(generator.generate_redirect_url(&InstallStatusSnapshot::default()), "");
/// ```
#[derive(Debug, Clone)]
pub struct PlatformLinkGenerator {
    config: SuccessLinkConfig,
    profile: Option<Profile>,
}

impl PlatformLinkGenerator {
    /// Create a generator for the given link configuration and profile.
    pub fn new(config: SuccessLinkConfig, profile: Option<Profile>) -> Self {
        Self { config, profile }
    }

    /// The platform hostname for the active profile's region.
    ///
    /// Defaults to the US hostname when no profile is active.
    fn platform_hostname(&self) -> &'static str {
        self.profile
            .as_ref()
            .map(|p| p.region.platform_hostname())
            .unwrap_or_else(|| Region::Us.platform_hostname())
    }

    /// A filtered entity-explorer URL.
    pub fn generate_explorer_link(&self, filter: &str) -> String {
        let account_id = self.profile.as_ref().map(|p| p.account_id).unwrap_or(0);
        format!(
            "https://{}/launcher/explorer?filters={}&accountId={}",
            self.platform_hostname(),
            BASE64.encode(filter),
            account_id,
        )
    }

    /// A deep link to one entity.
    pub fn generate_entity_link(&self, entity_guid: &str) -> String {
        format!(
            "https://{}/redirect/entity/{}",
            self.platform_hostname(),
            entity_guid
        )
    }

    /// The URL the user should visit after the run, or the empty string
    /// when no recipe was confirmed installed.
    pub fn generate_redirect_url(&self, status: &InstallStatusSnapshot) -> String {
        if !status.has_any_recipe_status(RecipeStatus::Installed) {
            return String::new();
        }

        match self.config.link_type {
            SuccessLinkType::Explorer => self.generate_explorer_link(&self.config.filter),
            SuccessLinkType::Entity => {
                self.generate_entity_link(status.host_entity_guid.as_deref().unwrap_or_default())
            }
        }
    }
}
