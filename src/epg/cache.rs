//! TTL cache with an injected clock.
//!
//! Cache entries are replaced wholesale on refresh and shared out as
//! `Arc<T>`, so readers never observe a partially updated document. The
//! clock is a trait object to make expiry deterministic in tests.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry<T> {
    fetched_at: DateTime<Utc>,
    value: Arc<T>,
}

pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    refresh: Mutex<()>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl_seconds: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            refresh: Mutex::new(()),
            ttl: Duration::seconds(ttl_seconds as i64),
            clock,
        }
    }

    /// Current value for `key` with its fetch time, or `None` when absent
    /// or past its TTL.
    pub async fn get(&self, key: &str) -> Option<(Arc<T>, DateTime<Utc>)> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if self.clock.now() - entry.fetched_at < self.ttl {
            Some((Arc::clone(&entry.value), entry.fetched_at))
        } else {
            None
        }
    }

    /// Replace the entry for `key`, returning the shared value and its
    /// fetch time.
    pub async fn insert(&self, key: String, value: T) -> (Arc<T>, DateTime<Utc>) {
        let value = Arc::new(value);
        let fetched_at = self.clock.now();
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                fetched_at,
                value: Arc::clone(&value),
            },
        );
        (value, fetched_at)
    }

    /// Serializes refreshes so concurrent misses for one source do not
    /// trigger duplicate fetches. Callers take the guard, re-check the
    /// cache, and only then fetch.
    pub async fn refresh_guard(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }
}
