// src/dedupe.rs
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Run-wide set of canonical hosts that have already been scheduled
///
/// The only access is [`DedupStore::insert`], which tests and sets under one
/// lock. A host is admitted at most once for the lifetime of the store.
#[derive(Clone, Default)]
pub struct DedupStore {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Returns true if `host` had not been seen before (and records it)
    pub async fn insert(&self, host: impl Into<String>) -> bool {
        let mut guard = self.inner.lock().await;
        guard.insert(host.into())
    }

    /// Number of hosts recorded so far
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_reports_first_sighting() {
        let store = DedupStore::new();

        assert!(store.insert("a.example:443").await);
        assert!(!store.insert("a.example:443").await);
        assert!(store.insert("b.example:443").await);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let store1 = DedupStore::new();
        let store2 = store1.clone();

        assert!(store1.insert("a.example:443").await);
        assert!(!store2.insert("a.example:443").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_admit_exactly_one() {
        let store = DedupStore::new();
        let mut handles = Vec::new();

        for _ in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert("contested.example:443").await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty() {
        let store = DedupStore::default();
        assert!(store.is_empty().await);
    }
}
