//! Refresh-on-stale orchestration.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::slot::CacheSlot;

/// Returns the slot's payload if fresh, otherwise fetches, serializes and
/// stores a new one.
///
/// A failing `fetch` (or a failing serialization) leaves the slot exactly as
/// it was; the error is returned to the caller and nothing is retried.
pub async fn get_or_refresh<F, Fut, T, E>(
    slot: &mut CacheSlot,
    ttl: Duration,
    now: Instant,
    fetch: F,
) -> Result<Bytes, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Serialize,
    E: From<serde_json::Error>,
{
    if let Some(payload) = slot.read_fresh(ttl, now) {
        return Ok(payload);
    }

    let value = fetch().await?;
    let payload = Bytes::from(serde_json::to_vec(&value)?);
    slot.write(payload.clone(), now);
    Ok(payload)
}

/// A route's cache slot, TTL and clock.
///
/// The slot lock is held for the whole refresh, so concurrent requests that
/// find the slot stale share a single upstream fetch: the first caller
/// fetches, the rest wait and are then served the fresh payload.
pub struct CachedRoute {
    name: &'static str,
    ttl: Duration,
    slot: Mutex<CacheSlot>,
    clock: Arc<dyn Clock>,
}

impl CachedRoute {
    /// Creates an empty route cache on the system clock.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_clock(name, ttl, Arc::new(SystemClock))
    }

    /// Creates an empty route cache on the given clock.
    pub fn with_clock(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            slot: Mutex::new(CacheSlot::new()),
            clock,
        }
    }

    /// Route name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Maximum age of a served payload.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serves the cached payload, refreshing it through `fetch` when stale.
    pub async fn get_or_refresh<F, Fut, T, E>(&self, fetch: F) -> Result<Bytes, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        E: From<serde_json::Error> + std::fmt::Display,
    {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if slot.is_fresh(self.ttl, now) {
            debug!(route = self.name, age = ?slot.age(now), "Cache hit");
        } else {
            info!(route = self.name, populated = !slot.is_empty(), "Refreshing cache");
        }

        let result = get_or_refresh(&mut slot, self.ttl, now, fetch).await;
        if let Err(e) = &result {
            warn!(route = self.name, error = %e, "Refresh failed, slot unchanged");
        }
        result
    }

    /// Current payload without refreshing, fresh or not.
    pub async fn peek(&self) -> Option<Bytes> {
        self.slot.lock().await.read()
    }
}

impl std::fmt::Debug for CachedRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRoute")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::clock::ManualClock;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Upstream,
        Encode,
    }

    impl From<serde_json::Error> for TestError {
        fn from(_: serde_json::Error) -> Self {
            TestError::Encode
        }
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    const TTL: Duration = Duration::from_secs(3600);

    fn route(clock: &Arc<ManualClock>) -> CachedRoute {
        CachedRoute::with_clock("test", TTL, clock.clone())
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let mut slot = CacheSlot::new();
        let now = Instant::now();

        let payload = get_or_refresh(&mut slot, TTL, now, || async {
            Ok::<_, TestError>(vec!["a", "b"])
        })
        .await
        .unwrap();

        assert_eq!(payload, Bytes::from_static(br#"["a","b"]"#));
        assert_eq!(slot.read(), Some(payload));
        assert_eq!(slot.created_at(), Some(now));
    }

    #[tokio::test]
    async fn test_hit_skips_fetch() {
        let clock = ManualClock::shared();
        let cache = route(&clock);
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..3 {
            let payload = cache
                .get_or_refresh(move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(42)
                })
                .await
                .unwrap();
            assert_eq!(payload, Bytes::from_static(b"42"));
            clock.advance(Duration::from_secs(60));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiry_refetches_once() {
        let clock = ManualClock::shared();
        let cache = route(&clock);
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, TestError>(n)
        };

        assert_eq!(cache.get_or_refresh(fetch).await.unwrap(), Bytes::from_static(b"0"));

        clock.advance(TTL);
        assert_eq!(cache.get_or_refresh(fetch).await.unwrap(), Bytes::from_static(b"0"));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get_or_refresh(fetch).await.unwrap(), Bytes::from_static(b"1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_slot_unchanged() {
        let clock = ManualClock::shared();
        let cache = route(&clock);

        cache
            .get_or_refresh(|| async { Ok::<_, TestError>("first") })
            .await
            .unwrap();
        clock.advance(TTL + Duration::from_secs(1));

        let err = cache
            .get_or_refresh(|| async { Err::<&str, _>(TestError::Upstream) })
            .await
            .unwrap_err();
        assert_eq!(err, TestError::Upstream);
        assert_eq!(cache.peek().await, Some(Bytes::from_static(br#""first""#)));
    }

    #[tokio::test]
    async fn test_failure_on_cold_slot_retries_next_request() {
        let clock = ManualClock::shared();
        let cache = route(&clock);
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let err = cache
            .get_or_refresh(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<u8, _>(TestError::Upstream)
            })
            .await;
        assert!(err.is_err());
        assert!(cache.peek().await.is_none());

        let ok = cache
            .get_or_refresh(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<u8, TestError>(7)
            })
            .await
            .unwrap();
        assert_eq!(ok, Bytes::from_static(b"7"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_serialization_failure_leaves_slot_unchanged() {
        use std::collections::HashMap;

        let mut slot = CacheSlot::new();
        let now = Instant::now();

        // JSON object keys must be strings.
        let err = get_or_refresh(&mut slot, TTL, now, || async {
            let mut map = HashMap::new();
            map.insert(vec![1u8], 1u8);
            Ok::<_, TestError>(map)
        })
        .await
        .unwrap_err();

        assert_eq!(err, TestError::Encode);
        assert!(slot.is_empty());
    }

    async fn serve(route: &CachedRoute, calls: &AtomicUsize) {
        route
            .get_or_refresh(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(route.name())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_routes_are_independent() {
        let clock = ManualClock::shared();
        let short = CachedRoute::with_clock("short", Duration::from_secs(60), clock.clone());
        let long = CachedRoute::with_clock("long", TTL, clock.clone());
        let short_calls = AtomicUsize::new(0);
        let long_calls = AtomicUsize::new(0);

        serve(&short, &short_calls).await;
        serve(&long, &long_calls).await;
        clock.advance(Duration::from_secs(120));
        serve(&short, &short_calls).await;
        serve(&long, &long_calls).await;

        assert_eq!(short_calls.load(Ordering::SeqCst), 2);
        assert_eq!(long_calls.load(Ordering::SeqCst), 1);
        assert_eq!(long.peek().await, Some(Bytes::from_static(br#""long""#)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stale_requests_share_one_fetch() {
        let cache = Arc::new(CachedRoute::new("herd", TTL));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, TestError>(vec![1, 2, 3])
                    })
                    .await
            }));
        }

        for handle in handles {
            let payload = handle.await.unwrap().unwrap();
            assert_eq!(payload, Bytes::from_static(b"[1,2,3]"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_report_errors() {
        let cache = Arc::new(CachedRoute::new("failing", TTL));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh(|| async { Err::<u8, _>(TestError::Upstream) })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap_err(), TestError::Upstream);
        }
        assert!(cache.peek().await.is_none());
    }
}
