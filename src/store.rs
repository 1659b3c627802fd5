//! Per-key content store: canonical English content plus translated
//! variants, with least-recently-written eviction and expiry.
//!
//! Recipe details, search results and category listings all use this store;
//! only the content type differs. Timestamps come from `tokio::time` so tests
//! can drive expiry with a paused clock.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::model::{RecipeDetail, ENGLISH};
use crate::normalize::canonical_key;

/// One cached entry: English content and whatever translations exist.
struct ContentRecord<T> {
    english: T,
    translations: HashMap<String, T>,
    last_written_at: Instant,
}

impl<T> ContentRecord<T> {
    fn is_expired(&self, now: Instant, expiry: Duration) -> bool {
        now.saturating_duration_since(self.last_written_at) > expiry
    }
}

pub struct ContentStore<T> {
    label: &'static str,
    // Reads use `peek`, so LRU order is write order.
    inner: Mutex<LruCache<String, ContentRecord<T>>>,
    expiry: Duration,
}

/// The store holding full recipe details.
pub type RecipeContentStore = ContentStore<RecipeDetail>;

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub label: &'static str,
    pub size: usize,
    pub capacity: usize,
    pub expiry_secs: u64,
    pub keys: Vec<String>,
}

impl<T: Clone> ContentStore<T> {
    pub fn new(label: &'static str, capacity: NonZeroUsize, expiry: Duration) -> Self {
        Self {
            label,
            inner: Mutex::new(LruCache::new(capacity)),
            expiry,
        }
    }

    /// Look up `name` in `language`. Expired records are purged and reported
    /// as absent. A cached English record does not imply a translation.
    pub fn get(&self, name: &str, language: &str) -> Option<T> {
        let key = canonical_key(name);
        let now = Instant::now();
        let mut cache = self.inner.lock();

        let expired = cache.peek(&key)?.is_expired(now, self.expiry);
        if expired {
            cache.pop(&key);
            debug!(store = self.label, key = %key, "record_expired");
            return None;
        }

        let record = cache.peek(&key)?;
        if language == ENGLISH {
            Some(record.english.clone())
        } else {
            record.translations.get(language).cloned()
        }
    }

    /// Write content for `name`. Creates the record with `english` if it is
    /// missing or expired; a live record keeps its original English content.
    /// `translated` is stored under `language` unless that is English.
    pub fn put(&self, name: &str, english: T, language: &str, translated: Option<T>) {
        let key = canonical_key(name);
        let now = Instant::now();
        let mut cache = self.inner.lock();

        let live = cache
            .peek(&key)
            .map(|r| !r.is_expired(now, self.expiry))
            .unwrap_or(false);

        if live {
            // get_mut promotes the record to most-recently-written.
            if let Some(record) = cache.get_mut(&key) {
                if language != ENGLISH {
                    if let Some(t) = translated {
                        record.translations.insert(language.to_string(), t);
                    }
                }
                record.last_written_at = now;
            }
            return;
        }

        let mut translations = HashMap::new();
        if language != ENGLISH {
            if let Some(t) = translated {
                translations.insert(language.to_string(), t);
            }
        }
        let record = ContentRecord {
            english,
            translations,
            last_written_at: now,
        };
        if let Some((evicted, _)) = cache.push(key.clone(), record) {
            if evicted != key {
                debug!(store = self.label, evicted = %evicted, "record_evicted");
            }
        }
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Drop every expired record; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.inner.lock();
        let dead: Vec<String> = cache
            .iter()
            .filter(|(_, r)| r.is_expired(now, self.expiry))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &dead {
            cache.pop(key);
        }
        if !dead.is_empty() {
            debug!(store = self.label, removed = dead.len(), "expired_records_purged");
        }
        dead.len()
    }

    pub fn stats(&self) -> StoreStats {
        self.purge_expired();
        let cache = self.inner.lock();
        StoreStats {
            label: self.label,
            size: cache.len(),
            capacity: cache.cap().get(),
            expiry_secs: self.expiry.as_secs(),
            keys: cache.iter().map(|(k, _)| k.clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
