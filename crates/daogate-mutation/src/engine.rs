//! Optimistic toggles with rollback.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{EntityCache, MutationSnapshot, Notice, Notifier, Toggle, TracingNotifier};

/// How a toggle settled. A toggle never fails outward: failures are
/// reported here after the cache has already been put back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome<E> {
    /// The write succeeded and the new value stays.
    Committed,
    /// Another toggle of the same entity was still in flight; nothing was
    /// changed or sent.
    Skipped,
    /// The write failed and every cached view was restored.
    RolledBack(E),
}

impl<E> ToggleOutcome<E> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::RolledBack(e) => Some(e),
            _ => None,
        }
    }
}

/// Applies boolean changes to cached entities immediately, then
/// reconciles with the result of the write.
///
/// At most one write per entity is in flight; a toggle arriving while one
/// is pending is dropped, not queued.
pub struct OptimisticEngine<K, V> {
    cache: EntityCache<K, V>,
    in_flight: Arc<Mutex<HashSet<K>>>,
    notifier: Arc<dyn Notifier>,
}

impl<K, V> Clone for OptimisticEngine<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            in_flight: Arc::clone(&self.in_flight),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<K, V> OptimisticEngine<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: Toggle,
{
    pub fn new(cache: EntityCache<K, V>) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn cache(&self) -> &EntityCache<K, V> {
        &self.cache
    }

    /// Returns `true` while a toggle of `key` is pending.
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// Sets the property of `key` to `desired` in every cached view, runs
    /// `write`, and commits or rolls back depending on its result.
    ///
    /// `write` is not called at all when the toggle is skipped. Failures
    /// are passed to the notifier unless they are [silent](Notice::is_silent).
    /// If the returned future is dropped before `write` settles, the cache
    /// is rolled back.
    pub async fn toggle<E, F, Fut>(&self, key: K, desired: bool, write: F) -> ToggleOutcome<E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Notice,
    {
        let Some(pending) = self.begin(key.clone(), desired) else {
            tracing::debug!(%key, desired, "toggle already in flight, skipping");
            return ToggleOutcome::Skipped;
        };

        match write().await {
            Ok(()) => {
                pending.commit();
                tracing::debug!(%key, desired, "optimistic update committed");
                ToggleOutcome::Committed
            }
            Err(e) => {
                pending.rollback();
                tracing::info!(%key, desired, error = %e, "optimistic update rolled back");
                if !e.is_silent() {
                    self.notifier.failure(&key.to_string(), &e.to_string());
                }
                ToggleOutcome::RolledBack(e)
            }
        }
    }

    fn begin(&self, key: K, desired: bool) -> Option<PendingToggle<'_, K, V>> {
        let claimed = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        if !claimed {
            return None;
        }
        let snapshot = self.cache.apply(&key, |value| value.toggled(desired));
        tracing::debug!(%key, desired, views = snapshot.views.len(), "optimistic update applied");
        Some(PendingToggle {
            engine: self,
            key,
            snapshot,
            settled: false,
        })
    }
}

/// Holds the in-flight claim on one entity.
///
/// Dropping it releases the claim; dropping it unsettled also rolls the
/// cache back.
struct PendingToggle<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    engine: &'a OptimisticEngine<K, V>,
    key: K,
    snapshot: MutationSnapshot<V>,
    settled: bool,
}

impl<K, V> PendingToggle<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn commit(mut self) {
        self.engine.cache.commit(&self.key, &self.snapshot);
        self.settled = true;
    }

    fn rollback(mut self) {
        self.engine.cache.rollback(&self.key, &self.snapshot);
        self.settled = true;
    }
}

impl<K, V> Drop for PendingToggle<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if !self.settled {
            self.engine.cache.rollback(&self.key, &self.snapshot);
        }
        self.engine
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::FutureExt;
    use tokio::sync::oneshot;

    use super::*;
    use crate::ViewId;

    const AUTHED: ViewId = ViewId("authenticated");
    const PUBLIC: ViewId = ViewId("public");

    #[derive(Debug, PartialEq)]
    struct Failed {
        silent: bool,
    }

    impl fmt::Display for Failed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("write failed")
        }
    }

    impl Notice for Failed {
        fn is_silent(&self) -> bool {
            self.silent
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<(String, String)>>);

    impl Notifier for Recording {
        fn failure(&self, entity: &str, message: &str) {
            self.0.lock().unwrap().push((entity.to_string(), message.to_string()));
        }
    }

    fn engine() -> (OptimisticEngine<u32, bool>, Arc<Recording>) {
        let cache = EntityCache::new();
        cache.insert(AUTHED, 7, false);
        cache.insert(PUBLIC, 7, false);
        let notices = Arc::new(Recording::default());
        let engine = OptimisticEngine::new(cache).with_notifier(Arc::clone(&notices) as Arc<dyn Notifier>);
        (engine, notices)
    }

    #[tokio::test]
    async fn test_toggle_success_commits_all_views() {
        let (engine, notices) = engine();

        let outcome = engine.toggle(7, true, || async { Ok::<(), Failed>(()) }).await;

        assert!(outcome.is_committed());
        assert_eq!(engine.cache().get(AUTHED, &7), Some(true));
        assert_eq!(engine.cache().get(PUBLIC, &7), Some(true));
        assert_eq!(engine.cache().take_stale(), vec![7]);
        assert!(notices.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_failure_restores_snapshot_and_notifies() {
        let (engine, notices) = engine();

        let outcome = engine
            .toggle(7, true, || async { Err(Failed { silent: false }) })
            .await;

        assert_eq!(outcome, ToggleOutcome::RolledBack(Failed { silent: false }));
        assert_eq!(engine.cache().get(AUTHED, &7), Some(false));
        assert_eq!(engine.cache().get(PUBLIC, &7), Some(false));
        assert_eq!(
            *notices.0.lock().unwrap(),
            vec![("7".to_string(), "write failed".to_string())]
        );
    }

    #[tokio::test]
    async fn test_toggle_silent_failure_rolls_back_without_notice() {
        let (engine, notices) = engine();

        engine
            .toggle(7, true, || async { Err(Failed { silent: true }) })
            .await;

        assert_eq!(engine.cache().get(AUTHED, &7), Some(false));
        assert!(notices.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_while_in_flight_is_skipped() {
        let (engine, _notices) = engine();
        let writes = AtomicUsize::new(0);
        let (release, gate) = oneshot::channel::<()>();

        let first = engine.toggle(7, true, || async {
            writes.fetch_add(1, Ordering::SeqCst);
            let _ = gate.await;
            Ok::<(), Failed>(())
        });
        let second = async {
            let outcome = engine
                .toggle(7, false, || async {
                    writes.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), Failed>(())
                })
                .await;
            // The first write is still pending and its value is displayed.
            assert_eq!(engine.cache().get(AUTHED, &7), Some(true));
            release.send(()).unwrap();
            outcome
        };

        let (first, second) = tokio::join!(first, second);

        assert!(first.is_committed());
        assert!(second.is_skipped());
        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert_eq!(engine.cache().get(AUTHED, &7), Some(true));
    }

    #[tokio::test]
    async fn test_toggle_after_failure_is_allowed_again() {
        let (engine, _notices) = engine();
        engine
            .toggle(7, true, || async { Err(Failed { silent: false }) })
            .await;

        let outcome = engine.toggle(7, true, || async { Ok::<(), Failed>(()) }).await;

        assert!(outcome.is_committed());
        assert!(!engine.is_in_flight(&7));
    }

    #[tokio::test]
    async fn test_toggle_dropped_mid_flight_rolls_back_and_releases() {
        let (engine, _notices) = engine();
        let (_release, gate) = oneshot::channel::<()>();

        let mut pending = Box::pin(engine.toggle(7, true, || async {
            let _ = gate.await;
            Ok::<(), Failed>(())
        }));
        assert!((&mut pending).now_or_never().is_none());
        assert_eq!(engine.cache().get(AUTHED, &7), Some(true));
        assert!(engine.is_in_flight(&7));

        drop(pending);

        assert_eq!(engine.cache().get(AUTHED, &7), Some(false));
        assert!(!engine.is_in_flight(&7));
    }

    #[tokio::test]
    async fn test_toggle_uncached_entity_still_writes() {
        let (engine, _notices) = engine();
        let writes = AtomicUsize::new(0);

        let outcome = engine
            .toggle(99, true, || async {
                writes.fetch_add(1, Ordering::SeqCst);
                Ok::<(), Failed>(())
            })
            .await;

        assert!(outcome.is_committed());
        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert_eq!(engine.cache().get(AUTHED, &99), None);
    }
}
