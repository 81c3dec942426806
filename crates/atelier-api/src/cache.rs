//! Time-bounded cache of API payloads.
//!
//! Entries are keyed by resource (`"tailorings"`, `"tailoring/prod/api"`,
//! ...) and hold any payload type. An expired entry is still returned when
//! a refresh fails, flagged as stale.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Default freshness window, matching the dashboard's refetch interval.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Expired entries stay around for this many TTLs as stale fallbacks.
const STALE_RETENTION: u32 = 10;

/// Upper bound on stored entries. The oldest go first.
pub const MAX_ENTRIES: usize = 512;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
    /// Insertion order, for eviction.
    seq: u64,
}

/// Result of a cache lookup.
#[derive(Debug)]
pub enum Lookup<T> {
    Fresh(Arc<T>),
    Stale(Arc<T>),
    Miss,
}

/// Outcome of [`ResourceCache::get_or_fetch`].
#[derive(Debug)]
pub struct Fetched<T> {
    /// Latest known payload, fresh or stale.
    pub value: Option<Arc<T>>,
    /// The refresh error, if the backend could not be reached.
    pub error: Option<ApiError>,
    /// `true` when `value` is older than the TTL.
    pub stale: bool,
}

impl<T> Fetched<T> {
    pub fn into_result(self) -> ApiResult<Arc<T>> {
        match (self.value, self.error) {
            (Some(value), _) => Ok(value),
            (None, Some(err)) => Err(err),
            (None, None) => Err(ApiError::NotFound("no cached value".to_string())),
        }
    }
}

pub struct ResourceCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
}

impl ResourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let entry = Entry {
            value: value.clone(),
            stored_at: Instant::now(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        let mut entries = self.entries.write().await;
        let retention = self.ttl.saturating_mul(STALE_RETENTION);
        let before = entries.len();
        entries.retain(|_, e| e.stored_at.elapsed() < retention);

        let key = key.into();
        if !entries.contains_key(&key) {
            while entries.len() >= MAX_ENTRIES {
                let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.seq)
                    .map(|(k, _)| k.clone())
                else {
                    break;
                };
                entries.remove(&oldest);
            }
        }
        entries.insert(key, entry);

        if entries.len() < before {
            debug!(evicted = before + 1 - entries.len(), "cache pruned");
        }
        value
    }

    /// Look up `key`. An entry of a different type counts as a miss.
    pub async fn lookup<T: Send + Sync + 'static>(&self, key: &str) -> Lookup<T> {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(key) else {
            return Lookup::Miss;
        };
        let Ok(value) = entry.value.clone().downcast::<T>() else {
            return Lookup::Miss;
        };
        if entry.stored_at.elapsed() < self.ttl {
            Lookup::Fresh(value)
        } else {
            Lookup::Stale(value)
        }
    }

    /// Returns `true` if an entry was removed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Serve `key` from cache while fresh; otherwise run `fetch` and store
    /// its result. A failed fetch falls back to the stale entry, if any.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Fetched<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let previous = match self.lookup::<T>(key).await {
            Lookup::Fresh(value) => {
                debug!(key, "cache hit");
                return Fetched {
                    value: Some(value),
                    error: None,
                    stale: false,
                };
            }
            Lookup::Stale(value) => Some(value),
            Lookup::Miss => None,
        };

        debug!(key, stale = previous.is_some(), "cache miss, fetching");
        match fetch().await {
            Ok(value) => Fetched {
                value: Some(self.insert(key, value).await),
                error: None,
                stale: false,
            },
            Err(err) => {
                warn!(key, error = %err, "fetch failed");
                Fetched {
                    stale: previous.is_some(),
                    value: previous,
                    error: Some(err),
                }
            }
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
