use std::future::Future;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tracing::debug;

/// Default lifetime of a cached schedule.
pub const DEFAULT_TTL_SECS: i64 = 60 * 60;

/// Time-bounded single-slot cache.
///
/// The entry lives behind an async mutex that stays locked while a refresh is
/// running, so callers arriving during expiry wait for the in-flight fetch and
/// share its result instead of hitting the upstream themselves. The refresh
/// runs on its own task and owns the lock, so it completes and fills the slot
/// even when the caller that started it goes away. A failed refresh leaves the
/// previous entry (and its timestamp) untouched.
#[derive(Debug)]
pub struct ScheduleCache<T> {
    ttl: Duration,
    entry: Arc<Mutex<Option<CacheEntry<T>>>>,
    // readable while a refresh holds `entry`
    fetched_at: Arc<RwLock<Option<DateTime<Utc>>>>,
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

impl<T> ScheduleCache<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Arc::new(Mutex::new(None)),
            fetched_at: Arc::new(RwLock::new(None)),
        }
    }

    /// Return the cached value, or run `producer` and cache its output when the
    /// slot is empty or older than the TTL.
    pub async fn fetch<F, Fut, E>(&self, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: From<JoinError> + Send + 'static,
    {
        self.fetch_with_clock(Utc::now, producer).await
    }

    pub(crate) async fn fetch_with_clock<C, F, Fut, E>(&self, now: C, producer: F) -> Result<T, E>
    where
        C: Fn() -> DateTime<Utc> + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: From<JoinError> + Send + 'static,
    {
        let mut guard = self.entry.clone().lock_owned().await;

        if let Some(entry) = guard.as_ref() {
            if entry.is_fresh(now(), self.ttl) {
                debug!("Schedule cache hit (fetched at {})", entry.fetched_at);
                return Ok(entry.value.clone());
            }
        }

        let stamp = self.fetched_at.clone();
        let refresh = tokio::spawn(async move {
            let value = producer().await?;
            let fetched_at = now();
            *guard = Some(CacheEntry {
                value: value.clone(),
                fetched_at,
            });
            *stamp.write().unwrap_or_else(|e| e.into_inner()) = Some(fetched_at);
            Ok(value)
        });

        refresh.await?
    }

    /// When the current entry was fetched, if there is one. Does not wait for
    /// a refresh in progress.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        *self.fetched_at.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> Default for ScheduleCache<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}
