//! External provider contracts and the default HTTP implementations.
//! Every call is a suspension point and may fail; callers own the fallback.

pub mod chat;
pub mod unsplash;

use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::error::ProviderError;

pub use chat::ChatClient;
pub use unsplash::UnsplashClient;

/// Structured generation: prompt plus JSON schema in, parsed JSON out.
pub trait GenerationProvider: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        schema: &'a serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, ProviderError>>;
}

/// Free-text completion used for translation prompts.
pub trait TranslationProvider: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>>;
}

/// Photo orientation requested from the search provider. Recipe cards and
/// hero images are all landscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
        }
    }
}

/// Best match from a photo search.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageHit {
    /// Base URL that accepts sizing/cropping query parameters.
    pub base_url: String,
}

pub trait ImageSearchProvider: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a str,
        orientation: Orientation,
    ) -> BoxFuture<'a, Result<Option<ImageHit>, ProviderError>>;
}
