//! In-memory LRU translation memo.
//! Key: blake3 hash of (kind | src_lang | tgt_lang | text), so entries stay
//! 32 bytes regardless of input size and identical text shared by different
//! recipes is translated once. Failures are never memoized.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{structured_prompt, text_prompt, Translation, TranslationOutcome};
use crate::error::ProviderError;
use crate::metrics::{metric_names, MetricsRegistry};
use crate::model::{Localizable, ENGLISH};
use crate::normalize::{detect_language, normalize_language, strip_code_fences};
use crate::providers::TranslationProvider;

const KIND_TEXT: &[u8] = b"text";
const KIND_STRUCTURED: &[u8] = b"json";

struct MemoEntry {
    value: String,
    inserted_at: Instant,
}

pub struct TranslationMemo {
    provider: Option<Arc<dyn TranslationProvider>>,
    inner: Mutex<LruCache<[u8; 32], MemoEntry>>,
    ttl: Option<Duration>,
    metrics: Arc<MetricsRegistry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoStats {
    pub size: usize,
    pub capacity: usize,
    pub ttl_secs: Option<u64>,
    pub provider_configured: bool,
}

impl TranslationMemo {
    pub fn new(
        provider: Option<Arc<dyn TranslationProvider>>,
        capacity: NonZeroUsize,
        ttl: Option<Duration>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            provider,
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
            metrics,
        }
    }

    /// Compute the memo key from translation parameters.
    pub fn compute_key(kind: &[u8], src_lang: &str, tgt_lang: &str, text: &str) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind);
        hasher.update(b"|");
        hasher.update(src_lang.as_bytes());
        hasher.update(b"|");
        hasher.update(tgt_lang.as_bytes());
        hasher.update(b"|");
        hasher.update(text.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Look up a memoized translation. Returns None if absent or expired.
    fn get(&self, key: &[u8; 32]) -> Option<String> {
        let mut memo = self.inner.lock();
        let expired = match (memo.get(key), self.ttl) {
            (None, _) => return None,
            (Some(entry), Some(ttl)) => entry.inserted_at.elapsed() >= ttl,
            (Some(_), None) => false,
        };
        if expired {
            memo.pop(key);
            return None;
        }
        memo.peek(key).map(|entry| entry.value.clone())
    }

    fn insert(&self, key: [u8; 32], value: String) {
        self.inner.lock().put(
            key,
            MemoEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    async fn call_provider(&self, prompt: &str) -> Option<Result<String, ProviderError>> {
        let provider = self.provider.as_ref()?;
        let span = self.metrics.span(metric_names::TRANSLATE);
        let result = provider.complete(prompt).await;
        span.finish();
        if result.is_err() {
            self.metrics.increment(metric_names::PROVIDER_FAILURE);
        }
        Some(result)
    }

    /// Translate free text from `source` into `target`.
    ///
    /// English is the pivot and never a target here: `target == "en"` or
    /// `target == source` returns `text` untouched. Provider failures return
    /// `text` as well.
    pub async fn translate(&self, text: &str, target: &str, source: &str) -> String {
        let target = normalize_language(target);
        let source = normalize_language(source);
        if target == source || target == ENGLISH {
            return text.to_string();
        }
        self.translate_text(text, &source, &target).await
    }

    /// Translate a user-typed query into English for catalog matching.
    /// Text already detected as English is returned as-is.
    pub async fn translate_to_english(&self, text: &str, source: &str) -> String {
        let source = normalize_language(source);
        if source == ENGLISH || detect_language(text) == Some(ENGLISH) {
            return text.to_string();
        }
        self.translate_text(text, &source, ENGLISH).await
    }

    async fn translate_text(&self, text: &str, source: &str, target: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        let key = Self::compute_key(KIND_TEXT, source, target, text);
        if let Some(hit) = self.get(&key) {
            self.metrics.increment(metric_names::MEMO_HIT);
            return hit;
        }
        self.metrics.increment(metric_names::MEMO_MISS);

        let prompt = text_prompt(text, source, target);
        match self.call_provider(&prompt).await {
            Some(Ok(reply)) => {
                let translated = strip_code_fences(&reply).to_string();
                if translated.is_empty() {
                    warn!(src = source, lang = target, "empty translation reply, keeping source text");
                    return text.to_string();
                }
                self.insert(key, translated.clone());
                translated
            }
            Some(Err(e)) => {
                warn!(error = %e, src = source, lang = target, "text translation failed, keeping source text");
                text.to_string()
            }
            None => text.to_string(),
        }
    }

    /// Translate a whole structured English value into `target` in one
    /// provider call. The result always has the source shape; on any failure
    /// it is the source itself and `outcome` says why.
    pub async fn translate_structured<T: Localizable>(
        &self,
        content: &T,
        target: &str,
    ) -> Translation<T> {
        let target = normalize_language(target);
        let unchanged = |outcome| Translation {
            content: content.clone(),
            outcome,
        };
        if target == ENGLISH {
            return unchanged(TranslationOutcome::Skipped);
        }

        let source_json = match serde_json::to_string(content) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "structured content not serializable");
                return unchanged(TranslationOutcome::Malformed);
            }
        };
        let key = Self::compute_key(KIND_STRUCTURED, ENGLISH, &target, &source_json);

        if let Some(hit) = self.get(&key) {
            if let Ok(value) = serde_json::from_str::<T>(&hit) {
                self.metrics.increment(metric_names::MEMO_HIT);
                return Translation {
                    content: value,
                    outcome: TranslationOutcome::Memoized,
                };
            }
            self.inner.lock().pop(&key);
        }
        self.metrics.increment(metric_names::MEMO_MISS);

        let prompt = structured_prompt(&source_json, &target);
        let reply = match self.call_provider(&prompt).await {
            None => return unchanged(TranslationOutcome::Unavailable),
            Some(Err(e)) => {
                warn!(error = %e, lang = %target, "structured translation failed");
                return unchanged(TranslationOutcome::ProviderFailed);
            }
            Some(Ok(reply)) => reply,
        };

        let mut translated: T = match serde_json::from_str(strip_code_fences(&reply)) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, lang = %target, "structured translation reply unparsable");
                return unchanged(TranslationOutcome::Malformed);
            }
        };
        if !translated.same_shape(content) {
            warn!(lang = %target, "structured translation changed shape");
            return unchanged(TranslationOutcome::Malformed);
        }
        translated.pin_untranslated(content);

        if let Ok(json) = serde_json::to_string(&translated) {
            self.insert(key, json);
        }
        debug!(lang = %target, "structured translation memoized");
        Translation {
            content: translated,
            outcome: TranslationOutcome::Translated,
        }
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn stats(&self) -> MemoStats {
        let memo = self.inner.lock();
        MemoStats {
            size: memo.len(),
            capacity: memo.cap().get(),
            ttl_secs: self.ttl.map(|t| t.as_secs()),
            provider_configured: self.provider.is_some(),
        }
    }
}
