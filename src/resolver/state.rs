//! Thread-safe key collections shared by the resolvers.
//!
//! `PendingKeys` is the multi-writer, insert-if-absent set filled during the
//! scan phase. `ResolvedMap` is written once per resolve pass by the fold step
//! and read concurrently afterwards. Poisoned locks are recovered: both
//! collections stay consistent under every individual operation.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Mutex, PoisonError, RwLock};

#[derive(Debug)]
struct PendingInner<K> {
    seen: HashSet<K>,
    order: Vec<K>,
}

impl<K> Default for PendingInner<K> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            order: Vec::new(),
        }
    }
}

/// Keys awaiting resolution, in first-submission order.
///
/// Grows monotonically; nothing is ever removed during a run.
#[derive(Debug)]
pub struct PendingKeys<K> {
    inner: Mutex<PendingInner<K>>,
}

impl<K> Default for PendingKeys<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(PendingInner::default()),
        }
    }
}

impl<K: Eq + Hash + Clone> PendingKeys<K> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `key` unless already queued. Returns true if it was new.
    pub fn insert(&self, key: K) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.seen.contains(&key) {
            return false;
        }
        inner.seen.insert(key.clone());
        inner.order.push(key);
        true
    }

    /// Copy of the queued keys in first-submission order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<K> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }
}

/// Resolved keys and their candidate canonical ids, in service order.
#[derive(Debug)]
pub struct ResolvedMap<K> {
    inner: RwLock<HashMap<K, Vec<String>>>,
}

impl<K> Default for ResolvedMap<K> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> ResolvedMap<K> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a complete response into the map under a single write lock.
    ///
    /// Entries without candidates are dropped. Repeated candidates within an
    /// entry keep their first position. Returns the number of keys stored.
    pub fn fold<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
    {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut stored = 0;
        for (key, candidates) in entries {
            let mut seen = HashSet::with_capacity(candidates.len());
            let candidates: Vec<String> = candidates
                .into_iter()
                .filter(|c| seen.insert(c.clone()))
                .collect();
            if candidates.is_empty() {
                continue;
            }
            map.insert(key, candidates);
            stored += 1;
        }
        stored
    }

    /// First candidate of `key`.
    #[must_use]
    pub fn first(&self, key: &K) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|c| c.first().cloned())
    }

    /// All candidates of `key`, in service order.
    #[must_use]
    pub fn candidates(&self, key: &K) -> Option<Vec<String>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of resolved keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
