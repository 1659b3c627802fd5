//! Cache sizing and provider settings.

use std::time::Duration;

use serde::Deserialize;

use crate::error::CoreError;

/// Default number of recipe records kept before eviction.
pub const MAX_RECORDS: usize = 50;
/// Default lifetime of a recipe record since its last write.
pub const EXPIRY_DURATION: Duration = Duration::from_secs(30 * 60);

/// Sizing and policy knobs for the caches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub recipe_capacity: usize,
    pub list_capacity: usize,
    #[serde(with = "duration_secs")]
    pub record_expiry: Duration,
    pub memo_capacity: usize,
    #[serde(with = "opt_duration_secs")]
    pub memo_ttl: Option<Duration>,
    /// Number of summaries requested from the generation provider per search.
    pub search_result_count: usize,
    /// Store English content under the target language when translation fell
    /// back, so the next resolution does not call the translator again.
    pub cache_translation_fallbacks: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            recipe_capacity: MAX_RECORDS,
            list_capacity: MAX_RECORDS,
            record_expiry: EXPIRY_DURATION,
            memo_capacity: 2048,
            memo_ttl: None,
            search_result_count: 6,
            cache_translation_fallbacks: true,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.recipe_capacity == 0 || self.list_capacity == 0 || self.memo_capacity == 0 {
            return Err(CoreError::Config("cache capacities must be > 0".into()));
        }
        if self.record_expiry.is_zero() {
            return Err(CoreError::Config("record_expiry must be non-zero".into()));
        }
        if self.search_result_count == 0 {
            return Err(CoreError::Config("search_result_count must be > 0".into()));
        }
        Ok(())
    }
}

/// Credentials and endpoints for the default HTTP providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub unsplash_access_key: Option<String>,
}

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

impl ProviderSettings {
    /// Read settings from `RECIPE_*` environment variables.
    /// Missing keys leave the corresponding provider disabled.
    pub fn from_env() -> Self {
        Self {
            llm_api_key: non_empty_var("RECIPE_LLM_API_KEY"),
            llm_base_url: non_empty_var("RECIPE_LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: non_empty_var("RECIPE_LLM_MODEL")
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            unsplash_access_key: non_empty_var("RECIPE_UNSPLASH_ACCESS_KEY"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod opt_duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|v| v.map(Duration::from_secs))
    }
}
