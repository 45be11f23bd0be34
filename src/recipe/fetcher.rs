//! Recipe catalog fetching.
//!
//! The remote catalog service lives behind [`RecipeFetcher`]; this module
//! ships the file-based implementation used for the `--localRecipes` and
//! `--recipePath` flows. A fetch failure is fatal to the run: with no
//! recipes there is nothing to install.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::InstallError;
use crate::recipe::Recipe;

/// Source of the candidate recipe catalog for one run.
#[async_trait]
pub trait RecipeFetcher: Send + Sync {
    /// Retrieve every candidate recipe.
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, InstallError>;
}

/// Loads recipes from local YAML documents.
///
/// Reads explicit recipe files and/or every `.yml`/`.yaml` document in a
/// directory override. Used in place of the remote catalog when the user
/// points the installer at local recipes.
///
/// # Example
///
/// ```rust,no_run
/// use observa_install::{RecipeFetcher, RecipeFileFetcher};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let fetcher = RecipeFileFetcher::new(vec!["./infra.yml".into()], None);
///     let recipes = fetcher.fetch_recipes().await.unwrap();
///     assert_eq!(recipes.len(), 1);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecipeFileFetcher {
    paths: Vec<PathBuf>,
    directory: Option<PathBuf>,
}

impl RecipeFileFetcher {
    /// Create a fetcher over explicit recipe files and an optional
    /// directory of recipes.
    pub fn new(paths: Vec<PathBuf>, directory: Option<PathBuf>) -> Self {
        Self { paths, directory }
    }

    fn load_file(path: &Path) -> Result<Recipe, InstallError> {
        let contents = std::fs::read_to_string(path).map_err(|e| InstallError::RecipeFileLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&contents).map_err(|e| InstallError::RecipeFileLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn is_recipe_file(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        )
    }
}

#[async_trait]
impl RecipeFetcher for RecipeFileFetcher {
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, InstallError> {
        let mut recipes = Vec::new();

        for path in &self.paths {
            recipes.push(Self::load_file(path)?);
        }

        if let Some(dir) = &self.directory {
            let entries = std::fs::read_dir(dir).map_err(|e| InstallError::FetchFailed {
                message: format!("could not read recipe directory {}: {}", dir.display(), e),
            })?;
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| Self::is_recipe_file(path))
                .collect();
            // Stable catalog order regardless of directory iteration order.
            files.sort();
            for path in files {
                recipes.push(Self::load_file(&path)?);
            }
        }

        if recipes.is_empty() {
            return Err(InstallError::FetchFailed {
                message: "no recipes found at the configured locations".to_string(),
            });
        }

        tracing::debug!(count = recipes.len(), "fetched recipes from local files");
        Ok(recipes)
    }
}
