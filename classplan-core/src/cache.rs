//! Process-local memo of catalog responses.
//!
//! Keys are the request uri plus its serialized parameters. Concurrent requests
//! for the same key share one fetch. There is no TTL: entries live until
//! `invalidate_all`, which is driven by the catalog-changed signal.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::ClassplanResult;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl From<&ApiRequest> for CacheKey {
    fn from(request: &ApiRequest) -> Self {
        CacheKey(request.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Default)]
pub struct ResultCache {
    slots: Mutex<HashMap<CacheKey, Arc<OnceCell<Value>>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A completed result, if one is cached. In-flight fetches count as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.slots.lock().get(key)?.get().cloned()
    }

    pub fn set(&self, key: CacheKey, value: Value) {
        self.slots
            .lock()
            .insert(key, Arc::new(OnceCell::new_with(Some(value))));
    }

    pub fn invalidate_all(&self) {
        let mut slots = self.slots.lock();
        tracing::debug!(entries = slots.len(), "Invalidating result cache");
        slots.clear();
    }

    /// Completed entries only.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `key`, or run `fetch` to produce it.
    ///
    /// Callers racing on the same key await a single `fetch`. Failures are not
    /// cached. A fetch still in flight when the cache is invalidated delivers its
    /// result to the callers already waiting but is not stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> ClassplanResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClassplanResult<Value>>,
    {
        let cell = {
            let mut slots = self.slots.lock();
            slots.entry(key.clone()).or_default().clone()
        };

        if cell.initialized() {
            tracing::debug!(%key, "Cache hit");
        }

        cell.get_or_try_init(fetch).await.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassplanError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(uri: &str) -> CacheKey {
        CacheKey::from(&ApiRequest::get(uri))
    }

    #[test]
    fn set_get_and_invalidate() {
        let cache = ResultCache::new();
        assert_eq!(cache.get(&key("terms.json")), None);

        cache.set(key("terms.json"), json!({"terms": []}));
        assert_eq!(cache.get(&key("terms.json")), Some(json!({"terms": []})));
        assert_eq!(cache.len(), 1);

        cache.invalidate_all();
        assert_eq!(cache.get(&key("terms.json")), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn second_fetch_of_same_key_is_served_from_cache() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_fetch(key("terms.json"), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(1))
                })
                .await
                .unwrap();
            assert_eq!(value, json!(1));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_fetches_share_one_request() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(json!("subjects"))
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch(key("term/5/subjects.json"), fetch),
            cache.get_or_fetch(key("term/5/subjects.json"), fetch),
        );

        assert_eq!(a.unwrap(), json!("subjects"));
        assert_eq!(b.unwrap(), json!("subjects"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = ResultCache::new();

        let failed = cache
            .get_or_fetch(key("terms.json"), || async {
                Err(ClassplanError::Transport("offline".into()))
            })
            .await;
        assert!(failed.is_err());

        let recovered = cache
            .get_or_fetch(key("terms.json"), || async { Ok(json!([])) })
            .await;
        assert_eq!(recovered.unwrap(), json!([]));
    }
}
