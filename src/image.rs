//! Representative-photo lookup memo.
//! Key: (canonical subject, width, height) → URL. Results never expire, and
//! failed lookups are memoized as the placeholder so a broken subject does
//! not hit the provider again.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics::{metric_names, MetricsRegistry};
use crate::normalize::canonical_key;
use crate::providers::{ImageSearchProvider, Orientation};

/// Photo used whenever no provider result is available.
const PLACEHOLDER_BASE: &str = "https://images.unsplash.com/photo-1546069901-ba9599a7e63c";
/// Appended to the subject so the search stays on food photography.
const QUERY_QUALIFIER: &str = "food dish";

pub type ImageKey = (String, u32, u32);

pub struct ImageLookupCache {
    provider: Option<Arc<dyn ImageSearchProvider>>,
    urls: Mutex<HashMap<ImageKey, String>>,
    metrics: Arc<MetricsRegistry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageStats {
    pub size: usize,
    pub provider_configured: bool,
}

/// Deterministic placeholder URL sized to `width` x `height`.
pub fn placeholder_url(width: u32, height: u32) -> String {
    sized_url(PLACEHOLDER_BASE, width, height)
}

fn sized_url(base: &str, width: u32, height: u32) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}w={width}&h={height}&fit=crop&q=80")
}

impl ImageLookupCache {
    pub fn new(provider: Option<Arc<dyn ImageSearchProvider>>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            provider,
            urls: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    pub fn key(subject: &str, width: u32, height: u32) -> ImageKey {
        (canonical_key(subject), width, height)
    }

    /// Resolve a photo URL for `subject`. Never fails: any miss ends in the
    /// placeholder, which is memoized like a real result.
    pub async fn resolve(&self, subject: &str, width: u32, height: u32) -> String {
        let key = Self::key(subject, width, height);
        if let Some(url) = self.urls.lock().get(&key) {
            self.metrics.increment(metric_names::IMAGE_HIT);
            return url.clone();
        }
        self.metrics.increment(metric_names::IMAGE_MISS);

        let url = match &self.provider {
            None => placeholder_url(width, height),
            Some(provider) => {
                let query = format!("{} {QUERY_QUALIFIER}", subject.trim());
                let span = self.metrics.span(metric_names::IMAGE_SEARCH);
                let result = provider.search(&query, Orientation::Landscape).await;
                span.finish();
                match result {
                    Ok(Some(hit)) => sized_url(&hit.base_url, width, height),
                    Ok(None) => {
                        debug!(subject = %key.0, "no photo found, using placeholder");
                        placeholder_url(width, height)
                    }
                    Err(e) => {
                        self.metrics.increment(metric_names::PROVIDER_FAILURE);
                        warn!(error = %e, subject = %key.0, "photo search failed, using placeholder");
                        placeholder_url(width, height)
                    }
                }
            }
        };

        self.urls.lock().insert(key, url.clone());
        url
    }

    pub fn clear(&self) {
        self.urls.lock().clear();
    }

    pub fn stats(&self) -> ImageStats {
        ImageStats {
            size: self.urls.lock().len(),
            provider_configured: self.provider.is_some(),
        }
    }
}
