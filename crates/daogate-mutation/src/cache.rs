//! Multi-view entity cache.
//!
//! The same entity is often cached more than once: a proposal fetched
//! through the authenticated query and again through the public one. An
//! optimistic write has to update every copy together and, on failure,
//! put every copy back.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Action, Optimistic};

/// Names one cached representation (one query's result set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub &'static str);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One view's part of a [`MutationSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot<V> {
    pub view: ViewId,
    pub previous: V,
    pub tentative: V,
}

/// What an optimistic write changed, taken right before applying it.
///
/// Owned by the write that created it and never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSnapshot<V> {
    pub views: Vec<ViewSnapshot<V>>,
}

impl<V> MutationSnapshot<V> {
    /// Returns `true` if the entity wasn't cached in any view.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

struct CacheInner<K, V> {
    views: HashMap<ViewId, HashMap<K, Optimistic<V>>>,
    stale: HashSet<K>,
}

/// Cached entities keyed by view and id.
///
/// Clones share the same storage. The lock is never held across an
/// `.await`.
pub struct EntityCache<K, V> {
    inner: Arc<Mutex<CacheInner<K, V>>>,
}

impl<K, V> Clone for EntityCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for EntityCache<K, V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                views: HashMap::new(),
                stale: HashSet::new(),
            })),
        }
    }
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value fetched from the server.
    ///
    /// If a write for this entity is pending, the fetched value becomes
    /// the committed one but the tentative value stays visible. Either
    /// way the entity is no longer stale in this view's eyes.
    pub fn insert(&self, view: ViewId, key: K, value: V) {
        let mut inner = self.lock();
        inner.stale.remove(&key);
        let entries = inner.views.entry(view).or_default();
        let next = match entries.get(&key) {
            Some(entry) => entry.reduce(Action::Refresh(value)),
            None => Optimistic::new(value),
        };
        entries.insert(key, next);
    }

    /// Returns the displayed value of `key` in `view`.
    pub fn get(&self, view: ViewId, key: &K) -> Option<V> {
        self.lock()
            .views
            .get(&view)
            .and_then(|entries| entries.get(key))
            .map(|entry| entry.current().clone())
    }

    /// Evicts `key` from `view`.
    pub fn remove(&self, view: ViewId, key: &K) -> Option<V> {
        self.lock()
            .views
            .get_mut(&view)
            .and_then(|entries| entries.remove(key))
            .map(|entry| entry.current().clone())
    }

    /// Returns `true` if any view shows a tentative value for `key`.
    pub fn is_pending(&self, key: &K) -> bool {
        self.lock()
            .views
            .values()
            .any(|entries| entries.get(key).is_some_and(Optimistic::is_pending))
    }

    /// Returns and forgets the entities whose committed values came from
    /// an optimistic write rather than a fetch. They should be refetched.
    pub fn take_stale(&self) -> Vec<K> {
        self.lock().stale.drain().collect()
    }

    /// Applies `update` to every cached copy of `key` and returns what was
    /// there before.
    pub(crate) fn apply(&self, key: &K, update: impl Fn(&V) -> V) -> MutationSnapshot<V> {
        let mut inner = self.lock();
        let mut views = Vec::new();
        for (view, entries) in inner.views.iter_mut() {
            let Some(entry) = entries.get_mut(key) else {
                continue;
            };
            let previous = entry.current().clone();
            let tentative = update(&previous);
            *entry = entry.reduce(Action::Apply(tentative.clone()));
            views.push(ViewSnapshot {
                view: *view,
                previous,
                tentative,
            });
        }
        views.sort_by_key(|s| s.view);
        MutationSnapshot { views }
    }

    /// Confirms the tentative values of `key` and marks it for refetch.
    pub(crate) fn commit(&self, key: &K, snapshot: &MutationSnapshot<V>) {
        let mut inner = self.lock();
        for s in &snapshot.views {
            if let Some(entry) = inner.views.get_mut(&s.view).and_then(|e| e.get_mut(key)) {
                *entry = entry.reduce(Action::Commit);
            }
        }
        inner.stale.insert(key.clone());
    }

    /// Puts every view touched by `snapshot` back.
    ///
    /// Views evicted while the write was in flight are restored from the
    /// snapshot. A refresh that landed in the meantime wins over the
    /// snapshot since it is newer server data.
    pub(crate) fn rollback(&self, key: &K, snapshot: &MutationSnapshot<V>) {
        let mut inner = self.lock();
        for s in &snapshot.views {
            let entries = inner.views.entry(s.view).or_default();
            let restored = match entries.get(key) {
                Some(entry) => entry.reduce(Action::Rollback),
                None => Optimistic::new(s.previous.clone()),
            };
            entries.insert(key.clone(), restored);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
