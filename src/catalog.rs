//! Static recipe catalog.
//! Loaded from JSON (embedded by default): full English recipes, extra card
//! summaries, curated category lists and the editorial featured list that
//! doubles as the search fallback.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::model::{Category, RecipeDetail, RecipeSummary};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Shortest query that is matched against static recipe names.
const MIN_NAME_QUERY_LEN: usize = 4;
/// More matches than this means the query is too broad for the catalog.
const MAX_NAME_MATCHES: usize = 3;

/// On-disk catalog format.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    recipes: Vec<RecipeDetail>,
    #[serde(default)]
    summaries: Vec<RecipeSummary>,
    categories: Vec<CategoryFile>,
    featured: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    id: String,
    name: String,
    recipes: Vec<String>,
}

struct CategoryListing {
    category: Category,
    recipes: Vec<RecipeSummary>,
}

pub struct StaticCatalog {
    recipes: HashMap<String, RecipeDetail>,
    /// Every known recipe as a card, in catalog order.
    summaries: Vec<RecipeSummary>,
    categories: Vec<CategoryListing>,
    featured: Vec<RecipeSummary>,
}

impl StaticCatalog {
    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let mut summaries: Vec<RecipeSummary> = file.recipes.iter().map(RecipeDetail::summary).collect();
        summaries.extend(file.summaries);
        let by_name: HashMap<&str, &RecipeSummary> =
            summaries.iter().map(|s| (s.name.as_str(), s)).collect();

        let lookup = |owner: &str, name: &str| -> Result<RecipeSummary, CatalogError> {
            by_name
                .get(name)
                .map(|s| (*s).clone())
                .ok_or_else(|| CatalogError::DanglingRecipe {
                    category: owner.to_string(),
                    recipe: name.to_string(),
                })
        };

        let categories = file
            .categories
            .into_iter()
            .map(|c| {
                let recipes = c
                    .recipes
                    .iter()
                    .map(|name| lookup(c.id.as_str(), name.as_str()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CategoryListing {
                    category: Category { id: c.id, name: c.name },
                    recipes,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let featured = file
            .featured
            .iter()
            .map(|name| lookup("featured", name.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let recipes = file
            .recipes
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();

        Ok(Self {
            recipes,
            summaries,
            categories,
            featured,
        })
    }

    /// Full recipe by exact English name.
    pub fn recipe(&self, name: &str) -> Option<&RecipeDetail> {
        self.recipes.get(name)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.iter().map(|c| c.category.clone()).collect()
    }

    /// Curated list for a category, matched case-insensitively on id or
    /// English display name.
    pub fn category_recipes(&self, id_or_name: &str) -> Option<Vec<RecipeSummary>> {
        let wanted = id_or_name.trim().to_lowercase();
        self.categories
            .iter()
            .find(|c| c.category.id.to_lowercase() == wanted || c.category.name.to_lowercase() == wanted)
            .map(|c| c.recipes.clone())
    }

    /// Editorial list shown on the home page and used when search has
    /// nothing better.
    pub fn featured(&self) -> Vec<RecipeSummary> {
        self.featured.clone()
    }

    /// Static recipes whose name contains `query` (case-insensitive).
    /// Only answers for queries of at least four characters that match one
    /// to three names; anything broader or shorter returns `None`.
    pub fn match_names(&self, query: &str) -> Option<Vec<RecipeSummary>> {
        let q = query.trim().to_lowercase();
        if q.chars().count() < MIN_NAME_QUERY_LEN {
            return None;
        }
        let matches: Vec<RecipeSummary> = self
            .summaries
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&q))
            .cloned()
            .collect();
        if matches.is_empty() || matches.len() > MAX_NAME_MATCHES {
            None
        } else {
            Some(matches)
        }
    }

    /// Names of all static recipes containing `query`, regardless of how
    /// many there are. Used to steer generation away from duplicates.
    pub fn names_containing(&self, query: &str) -> Vec<&str> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        self.summaries
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&q))
            .map(|s| s.name.as_str())
            .collect()
    }
}
