//! Layered content resolution: cache → canonical English → translation.
//!
//! Every resolution walks the same stages. The store is checked for the
//! requested language first; on a miss the English record is reused if
//! present, otherwise canonical English content is produced (static catalog,
//! then the generation provider) and persisted before any translation is
//! attempted, so a failed translation never loses the English result.
//! Recipe details, search results, category listings and the featured list
//! share this path and differ only in how canonical content is obtained.

pub mod prompt;
pub mod stage;

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::catalog::StaticCatalog;
use crate::config::CoreConfig;
use crate::error::{CoreError, ProviderError};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::model::{slugify, Category, Localizable, RecipeDetail, RecipeSummary, ENGLISH};
use crate::normalize::normalize_language;
use crate::providers::GenerationProvider;
use crate::store::{ContentStore, RecipeContentStore, StoreStats};
use crate::translate::TranslationMemo;

use prompt::{recipe_prompt, recipe_schema, search_prompt, summaries_schema, SummaryEnvelope};
use stage::{Stage, StageTracker};

const CATEGORIES_KEY: &str = "categories";
const FEATURED_KEY: &str = "featured";

pub struct ContentResolver {
    catalog: Arc<StaticCatalog>,
    recipes: RecipeContentStore,
    searches: ContentStore<Vec<RecipeSummary>>,
    /// Category listings and the featured list.
    listings: ContentStore<Vec<RecipeSummary>>,
    categories: ContentStore<Vec<Category>>,
    memo: Arc<TranslationMemo>,
    generator: Option<Arc<dyn GenerationProvider>>,
    metrics: Arc<MetricsRegistry>,
    cache_fallbacks: bool,
    search_result_count: usize,
}

fn capacity(n: usize, what: &str) -> Result<NonZeroUsize, CoreError> {
    NonZeroUsize::new(n).ok_or_else(|| CoreError::Config(format!("{what} must be > 0")))
}

impl ContentResolver {
    pub fn new(
        config: &CoreConfig,
        catalog: Arc<StaticCatalog>,
        memo: Arc<TranslationMemo>,
        generator: Option<Arc<dyn GenerationProvider>>,
        metrics: Arc<MetricsRegistry>,
    ) -> Result<Self, CoreError> {
        let recipe_cap = capacity(config.recipe_capacity, "recipe_capacity")?;
        let list_cap = capacity(config.list_capacity, "list_capacity")?;
        let expiry = config.record_expiry;
        Ok(Self {
            catalog,
            recipes: ContentStore::new("recipes", recipe_cap, expiry),
            searches: ContentStore::new("searches", list_cap, expiry),
            listings: ContentStore::new("listings", list_cap, expiry),
            categories: ContentStore::new("categories", list_cap, expiry),
            memo,
            generator,
            metrics,
            cache_fallbacks: config.cache_translation_fallbacks,
            search_result_count: config.search_result_count,
        })
    }

    /// Resolve a recipe in `language`. `None` means not found: the name is
    /// not in the catalog and generation failed or is unavailable.
    pub async fn resolve_recipe(&self, name: &str, language: &str) -> Option<RecipeDetail> {
        let request_id = uuid::Uuid::new_v4();
        let span = self.metrics.span(metric_names::RESOLVE_RECIPE);
        let result = self
            .resolve_layered(&self.recipes, name, language, || self.canonical_recipe(name))
            .instrument(info_span!("resolve", %request_id, kind = "recipe", recipe = %name.trim(), lang = %language))
            .await;
        span.finish();
        if result.is_none() {
            info!(recipe = %name.trim(), "recipe not found");
        }
        result
    }

    /// Search results in `language`. Never empty: when nothing matches and
    /// generation fails, the featured list is returned (not cached under
    /// the query, so the next search tries again).
    pub async fn resolve_search_results(&self, query: &str, language: &str) -> Vec<RecipeSummary> {
        if query.trim().is_empty() {
            return self.resolve_featured(language).await;
        }
        let request_id = uuid::Uuid::new_v4();
        let span = self.metrics.span(metric_names::RESOLVE_LIST);
        let found = async {
            // Search records are keyed by the English query.
            let english_query = self.memo.translate_to_english(query.trim(), language).await;
            let english_query = english_query.trim();
            debug!(english = %english_query, "search query pivoted");
            self.resolve_layered(&self.searches, english_query, language, || {
                self.canonical_search(english_query)
            })
            .await
        }
        .instrument(info_span!("resolve", %request_id, kind = "search", query = %query.trim(), lang = %language))
        .await;
        span.finish();
        match found {
            Some(list) if !list.is_empty() => list,
            _ => {
                debug!(query = %query.trim(), "search fell back to featured list");
                self.resolve_featured(language).await
            }
        }
    }

    pub async fn resolve_categories(&self, language: &str) -> Vec<Category> {
        let catalog = Arc::clone(&self.catalog);
        self.resolve_layered(&self.categories, CATEGORIES_KEY, language, || async move {
            Some(catalog.categories())
        })
        .await
        .unwrap_or_else(|| self.catalog.categories())
    }

    /// Curated list for one category; `None` for an unknown category.
    pub async fn resolve_category_recipes(
        &self,
        category: &str,
        language: &str,
    ) -> Option<Vec<RecipeSummary>> {
        let key = format!("category:{}", category.trim());
        let catalog = Arc::clone(&self.catalog);
        let category = category.to_string();
        self.resolve_layered(&self.listings, &key, language, || async move {
            catalog.category_recipes(&category)
        })
        .await
    }

    /// Editorial list for the home page; also the search fallback.
    pub async fn resolve_featured(&self, language: &str) -> Vec<RecipeSummary> {
        let catalog = Arc::clone(&self.catalog);
        self.resolve_layered(&self.listings, FEATURED_KEY, language, || async move {
            Some(catalog.featured())
        })
        .await
        .unwrap_or_else(|| self.catalog.featured())
    }

    async fn resolve_layered<T, F, Fut>(
        &self,
        store: &ContentStore<T>,
        key: &str,
        language: &str,
        canonical: F,
    ) -> Option<T>
    where
        T: Localizable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let language = normalize_language(language);
        let mut stages = StageTracker::new(key);

        if let Some(hit) = store.get(key, &language) {
            self.metrics.increment(metric_names::STORE_HIT);
            debug!(key = %key.trim(), lang = %language, "cache hit");
            stages.advance(Stage::PersistAndReturn);
            return Some(hit);
        }
        self.metrics.increment(metric_names::STORE_MISS);

        stages.advance(Stage::ResolveEnglish);
        let english = match store.get(key, ENGLISH) {
            Some(english) => {
                debug!(key = %key.trim(), "English content cached, skipping generation");
                english
            }
            None => {
                let Some(english) = canonical().await else {
                    stages.advance(Stage::PersistAndReturn);
                    return None;
                };
                store.put(key, english.clone(), ENGLISH, None);
                english
            }
        };

        if language == ENGLISH {
            stages.advance(Stage::PersistAndReturn);
            return Some(english);
        }

        stages.advance(Stage::Translate);
        let translation = self.memo.translate_structured(&english, &language).await;
        if translation.outcome.is_fallback() && !self.cache_fallbacks {
            debug!(key = %key.trim(), lang = %language, outcome = ?translation.outcome, "translation fell back, not cached");
        } else {
            store.put(key, english, &language, Some(translation.content.clone()));
        }

        stages.advance(Stage::PersistAndReturn);
        Some(translation.content)
    }

    async fn generate(&self, prompt: &str, schema: &serde_json::Value) -> Option<serde_json::Value> {
        let Some(generator) = self.generator.as_ref() else {
            debug!("no generation provider configured");
            return None;
        };
        let span = self.metrics.span(metric_names::GENERATE);
        let result: Result<serde_json::Value, ProviderError> = generator.generate(prompt, schema).await;
        span.finish();
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.metrics.increment(metric_names::PROVIDER_FAILURE);
                warn!(error = %e, "generation failed");
                None
            }
        }
    }

    async fn canonical_recipe(&self, name: &str) -> Option<RecipeDetail> {
        let name = name.trim();
        if let Some(recipe) = self.catalog.recipe(name) {
            return Some(recipe.clone());
        }

        let value = self.generate(&recipe_prompt(name), &recipe_schema()).await?;
        let mut detail: RecipeDetail = match serde_json::from_value(value) {
            Ok(detail) => detail,
            Err(e) => {
                warn!(error = %e, recipe = name, "generated recipe does not match schema");
                return None;
            }
        };
        if detail.ingredients.is_empty() || detail.instructions.is_empty() {
            warn!(recipe = name, "generated recipe has no ingredients or instructions");
            return None;
        }
        if detail.name.trim().is_empty() {
            detail.name = name.to_string();
        }
        if detail.id.trim().is_empty() {
            detail.id = slugify(&detail.name);
        }
        info!(recipe = name, "recipe generated");
        Some(detail)
    }

    /// Canonical English results for an already-English query.
    async fn canonical_search(&self, english_query: &str) -> Option<Vec<RecipeSummary>> {
        if let Some(list) = self.catalog.category_recipes(english_query) {
            debug!(query = %english_query, "query names a category");
            return Some(list);
        }
        if let Some(list) = self.catalog.match_names(english_query) {
            debug!(query = %english_query, matches = list.len(), "query matches static recipes");
            return Some(list);
        }

        let avoid = self.catalog.names_containing(english_query);
        let prompt = search_prompt(english_query, self.search_result_count, &avoid);
        let value = self.generate(&prompt, &summaries_schema()).await?;
        let envelope: SummaryEnvelope = match serde_json::from_value(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, query = %english_query, "generated search results do not match schema");
                return None;
            }
        };

        let mut recipes: Vec<RecipeSummary> = envelope
            .recipes
            .into_iter()
            .filter(|r| !r.name.trim().is_empty())
            .take(self.search_result_count)
            .collect();
        for r in &mut recipes {
            if r.id.trim().is_empty() {
                r.id = slugify(&r.name);
            }
        }
        if recipes.is_empty() {
            return None;
        }
        Some(recipes)
    }

    pub fn clear(&self) {
        self.recipes.clear();
        self.searches.clear();
        self.listings.clear();
        self.categories.clear();
    }

    pub fn store_stats(&self) -> Vec<StoreStats> {
        vec![
            self.recipes.stats(),
            self.searches.stats(),
            self.listings.stats(),
            self.categories.stats(),
        ]
    }
}
