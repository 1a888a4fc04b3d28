//! # Supply Cache
//!
//! [`TtlCache`] keeps two maps behind one mutex: finished values with the time
//! they were stored, and fetches that are still running. A lookup returns a
//! fresh value if there is one, otherwise joins the running fetch for the same
//! key, otherwise starts a new fetch. Failed fetches are not stored. Storing a
//! value evicts every expired one, so the map holds at most the keys fetched
//! within one TTL.
//!
//! [`SupplyCache`] applies it to token supply reads.

use crate::client::LedgerClient;
use anyhow::anyhow;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::time::{Duration, Instant};

/// Outcome of a fetch as seen by every caller that joined it.
pub type FetchResult<V> = Result<V, Arc<anyhow::Error>>;

type PendingFetch<V> = Shared<BoxFuture<'static, FetchResult<V>>>;

struct CacheState<K, V> {
    values: HashMap<K, (V, Instant)>,
    in_flight: HashMap<K, PendingFetch<V>>,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState {
                values: HashMap::new(),
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Returns the cached value for `key`, or resolves it with `fetch`.
    ///
    /// `fetch` is only called when there is neither a fresh value nor a running
    /// fetch for the key.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> FetchResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();
            if let Some((value, stored_at)) = state.values.get(&key) {
                if stored_at.elapsed() < self.ttl {
                    return Ok(value.clone());
                }
                state.values.remove(&key);
            }

            match state.in_flight.get(&key) {
                Some(pending) => pending.clone(),
                None => {
                    let pending = fetch().map(|res| res.map_err(Arc::new)).boxed().shared();
                    state.in_flight.insert(key.clone(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut state = self.lock();
        if state
            .in_flight
            .get(&key)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            state.in_flight.remove(&key);
        }
        if let Ok(value) = &result {
            let ttl = self.ttl;
            state
                .values
                .retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
            state
                .values
                .entry(key)
                .or_insert_with(|| (value.clone(), Instant::now()));
        }
        result
    }

    /// Number of stored values. Expired ones linger until the next store.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Token supply reads through a [`TtlCache`].
#[derive(Clone)]
pub struct SupplyCache {
    client: Arc<dyn LedgerClient>,
    cache: Arc<TtlCache<String, u64>>,
}

impl SupplyCache {
    pub fn new(client: Arc<dyn LedgerClient>, ttl: Duration) -> Self {
        Self {
            client,
            cache: Arc::new(TtlCache::new(ttl)),
        }
    }

    pub async fn supply(&self, mint: &str) -> anyhow::Result<u64> {
        let client = self.client.clone();
        let owned_mint = mint.to_string();
        self.cache
            .get_or_fetch(mint.to_string(), move || async move {
                Ok(client.get_supply(&owned_mint).await?)
            })
            .await
            .map_err(|e| anyhow!("supply lookup for {} failed: {:#}", mint, e))
    }
}
