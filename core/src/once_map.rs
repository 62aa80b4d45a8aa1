use crate::Result;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// OnceMap is a keyed construct-once cache.
///
/// For every key at most one initializer runs to completion successfully.
/// Callers that arrive while an initializer for the same key is in flight
/// wait for it and observe the same value. Callers with different keys never
/// wait on each other: the map lock is only held to find the per-key cell.
///
/// A failed initializer leaves its key empty, so the next caller tries again.
pub struct OnceMap<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for OnceMap<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Debug, V> Debug for OnceMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cells = self.cells.lock().expect("lock poisoned");
        f.debug_struct("OnceMap")
            .field("keys", &cells.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, running `init` if nobody has built it yet.
    pub async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = {
            let mut cells = self.cells.lock().expect("lock poisoned");
            cells.entry(key).or_default().clone()
        };

        cell.get_or_try_init(init).await.cloned()
    }

    /// Return the value for `key` if it has been built.
    pub fn get(&self, key: &K) -> Option<V> {
        let cells = self.cells.lock().expect("lock poisoned");
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys holding a built value.
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().expect("lock poisoned");
        cells.values().filter(|cell| cell.initialized()).count()
    }

    /// Check whether no value has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_concurrent_init_runs_once() {
        let map: Arc<OnceMap<String, Arc<String>>> = Arc::new(OnceMap::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let map = map.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                map.get_or_try_init("acct1".to_string(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(Arc::new("client".to_string()))
                })
                .await
                .expect("init must succeed")
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.expect("task must not panic"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for v in &values[1..] {
            assert!(Arc::ptr_eq(&values[0], v));
        }
        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let map: OnceMap<&'static str, u32> = OnceMap::new();

        let err = map
            .get_or_try_init("acct1", || async {
                Err(Error::service_unavailable("endpoint unreachable"))
            })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(map.get(&"acct1").is_none());
        assert!(map.is_empty());

        let v = map
            .get_or_try_init("acct1", || async { Ok(7) })
            .await
            .expect("second init must succeed");
        assert_eq!(v, 7);
        assert_eq!(map.get(&"acct1"), Some(7));
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let map: Arc<OnceMap<&'static str, u32>> = Arc::new(OnceMap::new());
        let release = Arc::new(Notify::new());

        let slow = {
            let map = map.clone();
            let release = release.clone();
            tokio::spawn(async move {
                map.get_or_try_init("slow", || async move {
                    release.notified().await;
                    Ok(1)
                })
                .await
            })
        };

        // Let the slow initializer start and park.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fast = tokio::time::timeout(
            Duration::from_secs(1),
            map.get_or_try_init("fast", || async { Ok(2) }),
        )
        .await
        .expect("distinct key must not wait")
        .expect("init must succeed");
        assert_eq!(fast, 2);

        release.notify_one();
        assert_eq!(slow.await.expect("task must not panic").unwrap(), 1);
    }
}
