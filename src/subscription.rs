//! UI-facing subscriptions: one per displayed recipe or image slot.
//! Each wraps a [`FetchGuard`] so only the latest request's result is
//! handed back, and shares an in-flight registry with its siblings.

use std::sync::Arc;

use tracing::debug;

use crate::guard::{FetchGuard, Fetched, InFlight};
use crate::image::{ImageKey, ImageLookupCache};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::model::RecipeDetail;
use crate::normalize::{canonical_key, normalize_language};
use crate::resolver::ContentResolver;

/// (canonical recipe name, language)
pub type RecipeKey = (String, String);

pub type RecipeFetches = InFlight<RecipeKey, Option<RecipeDetail>>;
pub type ImageFetches = InFlight<ImageKey, String>;

/// "Currently displayed recipe".
pub struct RecipeSubscription {
    guard: FetchGuard<RecipeKey, Option<RecipeDetail>>,
    resolver: Arc<ContentResolver>,
    metrics: Arc<MetricsRegistry>,
}

impl RecipeSubscription {
    pub(crate) fn new(
        in_flight: Arc<RecipeFetches>,
        resolver: Arc<ContentResolver>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            guard: FetchGuard::new(in_flight),
            resolver,
            metrics,
        }
    }

    /// Load `name` in `language`. `Fetched::Current(None)` is "not found";
    /// `Fetched::Stale` means a newer load or a cancel superseded this one.
    pub async fn load(&self, name: &str, language: &str) -> Fetched<Option<RecipeDetail>> {
        let language = normalize_language(language);
        let key = (canonical_key(name), language.clone());
        let resolver = Arc::clone(&self.resolver);
        let name = name.to_string();

        let fetched = self
            .guard
            .fetch(key, move || async move { resolver.resolve_recipe(&name, &language).await })
            .await;
        if fetched.is_stale() {
            self.metrics.increment(metric_names::STALE_DISCARD);
        }
        fetched
    }

    /// The view went away; drop whatever is still loading.
    pub fn cancel(&self) {
        debug!("recipe subscription cancelled");
        self.guard.cancel();
    }

    pub fn guard(&self) -> &FetchGuard<RecipeKey, Option<RecipeDetail>> {
        &self.guard
    }
}

/// "Currently displayed image" for one card or hero slot.
pub struct ImageSubscription {
    guard: FetchGuard<ImageKey, String>,
    images: Arc<ImageLookupCache>,
    metrics: Arc<MetricsRegistry>,
}

impl ImageSubscription {
    pub(crate) fn new(
        in_flight: Arc<ImageFetches>,
        images: Arc<ImageLookupCache>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            guard: FetchGuard::new(in_flight),
            images,
            metrics,
        }
    }

    pub async fn load(&self, subject: &str, width: u32, height: u32) -> Fetched<String> {
        let key = ImageLookupCache::key(subject, width, height);
        let images = Arc::clone(&self.images);
        let subject = subject.to_string();

        let fetched = self
            .guard
            .fetch(key, move || async move { images.resolve(&subject, width, height).await })
            .await;
        if fetched.is_stale() {
            self.metrics.increment(metric_names::STALE_DISCARD);
        }
        fetched
    }

    pub fn cancel(&self) {
        self.guard.cancel();
    }

    pub fn guard(&self) -> &FetchGuard<ImageKey, String> {
        &self.guard
    }
}
