//! Translation through the memo: free text, English pivot for search
//! queries, and whole structured values in a single provider call.

pub mod memo;

pub use memo::{MemoStats, TranslationMemo};

use crate::normalize::language_name;

/// How a structured translation request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// Target is English; nothing to do.
    Skipped,
    /// Served from the memo.
    Memoized,
    /// Fresh provider translation, now memoized.
    Translated,
    /// No translation provider is configured.
    Unavailable,
    /// The provider call failed.
    ProviderFailed,
    /// The reply could not be parsed back into the source shape.
    Malformed,
}

impl TranslationOutcome {
    /// True when the returned content is the untranslated source because
    /// translation was attempted and could not be done.
    pub fn is_fallback(self) -> bool {
        matches!(
            self,
            TranslationOutcome::Unavailable
                | TranslationOutcome::ProviderFailed
                | TranslationOutcome::Malformed
        )
    }
}

/// Result of a structured translation. `content` always has the source shape.
#[derive(Debug, Clone)]
pub struct Translation<T> {
    pub content: T,
    pub outcome: TranslationOutcome,
}

fn text_prompt(text: &str, source: &str, target: &str) -> String {
    format!(
        "Translate the following text from {} to {}. Keep culinary terms natural for native speakers. \
         Return only the translated text.\n\n{}",
        language_name(source),
        language_name(target),
        text
    )
}

fn structured_prompt(json: &str, target: &str) -> String {
    format!(
        "Translate every human-readable text value in the following JSON from English to {}. \
         Keep all keys, ids, numbers, and the number of array elements exactly as they are. \
         Return only the JSON.\n\n{}",
        language_name(target),
        json
    )
}
