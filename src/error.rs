//! Error types.
//! Provider failures never escape the resolution layer; they are logged and
//! replaced by a fallback. Only construction problems reach the caller.

use thiserror::Error;

/// Failure of an external provider call (generation, translation, image search).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider request timed out")]
    Timeout,
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("provider credential missing: {0}")]
    MissingCredential(&'static str),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Malformed(e.to_string())
    }
}

/// Static catalog could not be loaded.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("category {category} lists unknown recipe {recipe}")]
    DanglingRecipe { category: String, recipe: String },
}

/// Errors raised while assembling a [`crate::RecipeCore`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("invalid configuration: {0}")]
    Config(String),
}
