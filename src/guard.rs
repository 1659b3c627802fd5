//! Fetch guards: generation tokens + in-flight request sharing.
//! Ensures stale fetches cannot write results to visible state, and that an
//! identical outstanding request is joined instead of reissued.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Identity of one request issued through a [`FetchGuard`].
#[derive(Debug, Clone)]
pub struct GuardToken {
    generation: u64,
    token: CancellationToken,
}

impl GuardToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancellation signal for this request; fires when it is superseded or
    /// the subscription is cancelled.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}

/// Outcome of a guarded fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<V> {
    /// Result of the most recent request for this subscription.
    Current(V),
    /// A newer request (or a cancel) superseded this one; drop the value.
    Stale,
}

impl<V> Fetched<V> {
    pub fn current(self) -> Option<V> {
        match self {
            Fetched::Current(v) => Some(v),
            Fetched::Stale => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Fetched::Stale)
    }
}

type SharedFetch<V> = Shared<BoxFuture<'static, V>>;

struct Pending<V: Clone> {
    fetch: SharedFetch<V>,
    waiters: usize,
}

/// Outstanding requests keyed by what they fetch. Shared between all guards
/// of one kind so two views asking for the same thing share one call.
///
/// An entry lives as long as someone awaits it. When the last waiter
/// finishes or is dropped (timeout, unmounted view, aborted task) the entry
/// goes away with it.
pub struct InFlight<K, V: Clone> {
    pending: Mutex<HashMap<K, Pending<V>>>,
}

impl<K, V> Default for InFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// One caller's claim on a pending entry; releases it on drop.
struct Waiter<'a, K: Eq + Hash, V: Clone> {
    pending: &'a Mutex<HashMap<K, Pending<V>>>,
    key: K,
    // Never polled, so it still identifies the entry after completion.
    fetch: SharedFetch<V>,
}

impl<K: Eq + Hash, V: Clone> Drop for Waiter<'_, K, V> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();
        let Some(entry) = pending.get_mut(&self.key) else {
            return;
        };
        if !entry.fetch.ptr_eq(&self.fetch) {
            return;
        }
        entry.waiters = entry.waiters.saturating_sub(1);
        if entry.waiters == 0 {
            pending.remove(&self.key);
        }
    }
}

impl<K, V> InFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Run `make()` for `key`, or join the call already running for it.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let waiter = {
            let mut pending = self.pending.lock();
            let fetch = match pending.get_mut(&key) {
                Some(existing) => {
                    debug!(waiters = existing.waiters + 1, "joining in-flight request");
                    existing.waiters += 1;
                    existing.fetch.clone()
                }
                None => {
                    let fetch = make().boxed().shared();
                    pending.insert(
                        key.clone(),
                        Pending {
                            fetch: fetch.clone(),
                            waiters: 1,
                        },
                    );
                    fetch
                }
            };
            Waiter {
                pending: &self.pending,
                key,
                fetch,
            }
        };

        waiter.fetch.clone().await
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-subscription staleness guard ("currently displayed recipe",
/// "currently displayed image"). Each `begin` advances the generation,
/// cancels the previous token and issues a fresh one.
pub struct FetchGuard<K, V: Clone> {
    current_token: RwLock<CancellationToken>,
    generation: AtomicU64,
    in_flight: Arc<InFlight<K, V>>,
}

impl<K, V> FetchGuard<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(in_flight: Arc<InFlight<K, V>>) -> Self {
        Self {
            current_token: RwLock::new(CancellationToken::new()),
            generation: AtomicU64::new(0),
            in_flight,
        }
    }

    /// Start a new request; every earlier token becomes stale.
    pub fn begin(&self) -> GuardToken {
        let mut token_guard = self.current_token.write();
        token_guard.cancel();
        let fresh = CancellationToken::new();
        *token_guard = fresh.clone();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        GuardToken {
            generation,
            token: fresh,
        }
    }

    /// Returns true if `token` belongs to the latest request and was not cancelled.
    #[inline]
    pub fn is_current(&self, token: &GuardToken) -> bool {
        !token.token.is_cancelled() && self.generation.load(Ordering::SeqCst) == token.generation
    }

    /// Invalidate the current request (view unmounted, navigated away).
    pub fn cancel(&self) {
        let token_guard = self.current_token.read();
        token_guard.cancel();
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Begin a request for `key` and await it, joining an identical
    /// in-flight call if there is one. The value is only handed back if no
    /// newer request or cancel happened meanwhile.
    pub async fn fetch<F, Fut>(&self, key: K, make: F) -> Fetched<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let token = self.begin();
        let value = self.in_flight.run(key, make).await;
        if self.is_current(&token) {
            Fetched::Current(value)
        } else {
            debug!(generation = token.generation, "discarding stale fetch result");
            Fetched::Stale
        }
    }
}
