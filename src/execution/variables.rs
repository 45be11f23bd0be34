//! Recipe variable preparation.
//!
//! Install procedures are opaque scripts parameterized by environment
//! variables: the profile's keys and account, plus discovered host facts.

use std::collections::HashMap;

use crate::config::Profile;
use crate::discovery::DiscoveryManifest;
use crate::recipe::Recipe;

/// Builds the variable set substituted into each install procedure.
#[derive(Debug, Clone, Default)]
pub struct RecipeVarProvider {
    profile: Option<Profile>,
}

impl RecipeVarProvider {
    /// Create a provider for the active profile.
    pub fn new(profile: Option<Profile>) -> Self {
        Self { profile }
    }

    /// The environment for one recipe's install procedure.
    pub fn prepare(&self, manifest: &DiscoveryManifest, recipe: &Recipe) -> HashMap<String, String> {
        let mut vars = HashMap::new();

        if let Some(profile) = &self.profile {
            vars.insert(
                "OBSERVA_LICENSE_KEY".to_string(),
                profile.license_key.clone(),
            );
            vars.insert(
                "OBSERVA_ACCOUNT_ID".to_string(),
                profile.account_id.to_string(),
            );
            vars.insert("OBSERVA_REGION".to_string(), profile.region.to_string());
            if let Some(insert_key) = &profile.insert_key {
                vars.insert("OBSERVA_INSERT_KEY".to_string(), insert_key.clone());
            }
        }

        vars.insert("OBSERVA_OS".to_string(), manifest.os.clone());
        vars.insert("OBSERVA_ARCH".to_string(), manifest.arch.clone());
        if let Some(hostname) = &manifest.hostname {
            vars.insert("OBSERVA_HOSTNAME".to_string(), hostname.clone());
        }
        vars.insert("OBSERVA_RECIPE_NAME".to_string(), recipe.name.clone());

        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Region;

    fn profile() -> Profile {
        Profile {
            account_id: 12345,
            region: Region::Eu,
            license_key: "license-key".to_string(),
            insert_key: Some("insert-key".to_string()),
        }
    }

    #[test]
    fn test_prepare_with_profile() {
        let provider = RecipeVarProvider::new(Some(profile()));
        let manifest = DiscoveryManifest {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            hostname: Some("web-1".to_string()),
            ..Default::default()
        };
        let recipe = Recipe {
            name: "infrastructure-agent-installer".to_string(),
            ..Default::default()
        };

        let vars = provider.prepare(&manifest, &recipe);
        assert_eq!(vars["OBSERVA_LICENSE_KEY"], "license-key");
        assert_eq!(vars["OBSERVA_INSERT_KEY"], "insert-key");
        assert_eq!(vars["OBSERVA_ACCOUNT_ID"], "12345");
        assert_eq!(vars["OBSERVA_REGION"], "eu");
        assert_eq!(vars["OBSERVA_OS"], "linux");
        assert_eq!(vars["OBSERVA_HOSTNAME"], "web-1");
        assert_eq!(vars["OBSERVA_RECIPE_NAME"], "infrastructure-agent-installer");
    }

    #[test]
    fn test_prepare_without_profile_still_carries_host_facts() {
        let provider = RecipeVarProvider::default();
        let manifest = DiscoveryManifest {
            os: "linux".to_string(),
            arch: "aarch64".to_string(),
            ..Default::default()
        };

        let vars = provider.prepare(&manifest, &Recipe::default());
        assert!(!vars.contains_key("OBSERVA_LICENSE_KEY"));
        assert_eq!(vars["OBSERVA_ARCH"], "aarch64");
        assert!(!vars.contains_key("OBSERVA_HOSTNAME"));
    }
}
