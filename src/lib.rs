//! Recipe content cache: the layer between a multilingual recipe browser and
//! its LLM and photo-search providers.
//!
//! [`RecipeCore`] owns every cache and is the only thing the UI talks to.
//! It is cheap to clone and meant to be built once at startup and handed to
//! whatever needs it.

pub mod catalog;
pub mod config;
pub mod error;
pub mod guard;
pub mod image;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod store;
pub mod subscription;
pub mod translate;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use catalog::StaticCatalog;
use config::{CoreConfig, ProviderSettings};
use error::CoreError;
use guard::InFlight;
use image::{ImageLookupCache, ImageStats};
use metrics::{MetricSummary, MetricsRegistry};
use model::{Category, RecipeDetail, RecipeSummary};
use providers::{
    ChatClient, GenerationProvider, ImageSearchProvider, TranslationProvider, UnsplashClient,
};
use resolver::ContentResolver;
use store::StoreStats;
use subscription::{ImageFetches, ImageSubscription, RecipeFetches, RecipeSubscription};
use translate::{MemoStats, TranslationMemo};

pub use guard::Fetched;

/// The external providers the core may call. Any of them can be absent;
/// the core then serves static content, English text and placeholders.
#[derive(Clone, Default)]
pub struct Providers {
    pub generator: Option<Arc<dyn GenerationProvider>>,
    pub translator: Option<Arc<dyn TranslationProvider>>,
    pub images: Option<Arc<dyn ImageSearchProvider>>,
}

impl Providers {
    /// Build the default HTTP providers for whichever credentials are set.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, CoreError> {
        let mut providers = Providers::default();

        if settings.llm_api_key.is_some() {
            let chat = Arc::new(ChatClient::from_settings(settings)?);
            providers.generator = Some(chat.clone());
            providers.translator = Some(chat);
            info!(model = %settings.llm_model, "LLM client initialized");
        } else {
            warn!("no LLM API key, recipe generation and translation disabled");
        }

        if settings.unsplash_access_key.is_some() {
            providers.images = Some(Arc::new(UnsplashClient::from_settings(settings)?));
            info!("photo search client initialized");
        } else {
            warn!("no photo search key, using placeholder images");
        }

        Ok(providers)
    }
}

/// Snapshot of every cache, for debugging and admin views.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub stores: Vec<StoreStats>,
    pub translations: MemoStats,
    pub images: ImageStats,
    pub in_flight_recipes: usize,
    pub in_flight_images: usize,
    pub latencies: HashMap<String, MetricSummary>,
    pub counters: HashMap<String, u64>,
}

#[derive(Clone)]
pub struct RecipeCore {
    resolver: Arc<ContentResolver>,
    memo: Arc<TranslationMemo>,
    images: Arc<ImageLookupCache>,
    metrics: Arc<MetricsRegistry>,
    recipe_fetches: Arc<RecipeFetches>,
    image_fetches: Arc<ImageFetches>,
}

impl RecipeCore {
    pub fn new(
        config: CoreConfig,
        catalog: StaticCatalog,
        providers: Providers,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let metrics = Arc::new(MetricsRegistry::new());

        let memo_capacity = NonZeroUsize::new(config.memo_capacity)
            .ok_or_else(|| CoreError::Config("memo_capacity must be > 0".into()))?;
        let memo = Arc::new(TranslationMemo::new(
            providers.translator,
            memo_capacity,
            config.memo_ttl,
            Arc::clone(&metrics),
        ));
        let resolver = Arc::new(ContentResolver::new(
            &config,
            Arc::new(catalog),
            Arc::clone(&memo),
            providers.generator,
            Arc::clone(&metrics),
        )?);
        let images = Arc::new(ImageLookupCache::new(providers.images, Arc::clone(&metrics)));

        info!(
            recipe_capacity = config.recipe_capacity,
            expiry_secs = config.record_expiry.as_secs(),
            "recipe core ready"
        );

        Ok(Self {
            resolver,
            memo,
            images,
            metrics,
            recipe_fetches: Arc::new(InFlight::new()),
            image_fetches: Arc::new(InFlight::new()),
        })
    }

    /// Built-in catalog, default sizing, providers from `RECIPE_*` env vars.
    pub fn from_env() -> Result<Self, CoreError> {
        let providers = Providers::from_settings(&ProviderSettings::from_env())?;
        Self::new(CoreConfig::default(), StaticCatalog::builtin()?, providers)
    }

    /// `None` means the recipe could not be found or generated.
    pub async fn resolve_recipe(&self, name: &str, language: &str) -> Option<RecipeDetail> {
        self.resolver.resolve_recipe(name, language).await
    }

    pub async fn resolve_search_results(&self, query: &str, language: &str) -> Vec<RecipeSummary> {
        self.resolver.resolve_search_results(query, language).await
    }

    pub async fn resolve_categories(&self, language: &str) -> Vec<Category> {
        self.resolver.resolve_categories(language).await
    }

    pub async fn resolve_category_recipes(
        &self,
        category: &str,
        language: &str,
    ) -> Option<Vec<RecipeSummary>> {
        self.resolver.resolve_category_recipes(category, language).await
    }

    pub async fn resolve_featured(&self, language: &str) -> Vec<RecipeSummary> {
        self.resolver.resolve_featured(language).await
    }

    /// Always a usable URL; falls back to a placeholder photo.
    pub async fn resolve_image(&self, subject: &str, width: u32, height: u32) -> String {
        self.images.resolve(subject, width, height).await
    }

    pub fn recipe_subscription(&self) -> RecipeSubscription {
        RecipeSubscription::new(
            Arc::clone(&self.recipe_fetches),
            Arc::clone(&self.resolver),
            Arc::clone(&self.metrics),
        )
    }

    pub fn image_subscription(&self) -> ImageSubscription {
        ImageSubscription::new(
            Arc::clone(&self.image_fetches),
            Arc::clone(&self.images),
            Arc::clone(&self.metrics),
        )
    }

    pub fn clear_caches(&self) {
        self.resolver.clear();
        self.memo.clear();
        self.images.clear();
        info!("all caches cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            stores: self.resolver.store_stats(),
            translations: self.memo.stats(),
            images: self.images.stats(),
            in_flight_recipes: self.recipe_fetches.len(),
            in_flight_images: self.image_fetches.len(),
            latencies: self.metrics.summary(),
            counters: self.metrics.counters(),
        }
    }
}

/// Install a `tracing` subscriber. Honors `RUST_LOG`, defaulting to
/// `recipe_cache=debug`; `json` switches to JSON lines.
pub fn init_tracing(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("recipe_cache=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
