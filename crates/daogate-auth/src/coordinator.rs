//! Single-flight gate for sign-in handshakes.
//!
//! Any number of call sites may ask for authentication at the same time
//! (two widgets each reacting to a 401, a background refresh, a button).
//! The [`AuthCoordinator`] makes sure only the first of them starts a
//! handshake. Everyone else joins it and receives a clone of the same
//! [`AuthResult`].
//!
//! The pending slot is cleared by a drop guard living inside the flight,
//! so it is released whether the handshake succeeds, fails or panics.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use daogate_protocol::SessionToken;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::runtime::Handle;

use crate::AuthError;

// ---------------------------------------------------------------------------
// AuthResult
// ---------------------------------------------------------------------------

/// The outcome every caller of `authenticate()` observes.
///
/// It is either a token or an error, never both and never neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Authenticated(SessionToken),
    Failed(AuthError),
}

impl AuthResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            Self::Authenticated(token) => Some(token),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AuthError> {
        match self {
            Self::Authenticated(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<SessionToken, AuthError> {
        match self {
            Self::Authenticated(token) => Ok(token),
            Self::Failed(e) => Err(e),
        }
    }
}

impl From<Result<SessionToken, AuthError>> for AuthResult {
    fn from(result: Result<SessionToken, AuthError>) -> Self {
        match result {
            Ok(token) => Self::Authenticated(token),
            Err(e) => Self::Failed(e),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthCoordinator
// ---------------------------------------------------------------------------

type Flight = Shared<BoxFuture<'static, AuthResult>>;

#[derive(Default)]
struct Slot {
    /// Bumped by `reset()`. A flight only clears the slot it was started in.
    generation: u64,
    flight: Option<Flight>,
}

/// Holds at most one in-flight handshake.
///
/// Construct one per client and hand clones to every call site; clones
/// share the same slot.
#[derive(Clone, Default)]
pub struct AuthCoordinator {
    slot: Arc<Mutex<Slot>>,
}

impl AuthCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `flow` unless a handshake is already in flight, in which case
    /// the caller joins that one instead and `flow` is never called.
    ///
    /// The flight is registered when this method is called, not when the
    /// returned future is first polled, so callers join in call order.
    /// Inside a Tokio runtime the flight is also driven by a spawned task,
    /// so it completes even if every caller drops its future.
    /// The returned future never fails: errors and panics inside `flow`
    /// come back as [`AuthResult::Failed`].
    pub fn authenticate<F, Fut>(&self, flow: F) -> impl Future<Output = AuthResult> + Send + 'static
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionToken, AuthError>> + Send + 'static,
    {
        if let Some(flight) = self.current() {
            tracing::debug!("joining in-flight authentication");
            return flight;
        }

        // Built outside the lock: `flow` may call back into the coordinator.
        let work = flow();

        let mut slot = lock(&self.slot);
        if let Some(flight) = &slot.flight {
            // Another caller registered first; `work` was never polled.
            tracing::debug!("joining in-flight authentication");
            return flight.clone();
        }

        tracing::debug!(generation = slot.generation, "starting authentication");
        let guard = PendingGuard {
            slot: Arc::clone(&self.slot),
            generation: slot.generation,
        };
        let flight = async move {
            let _guard = guard;
            let result = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => AuthResult::from(result),
                Err(_) => {
                    tracing::error!("authentication flow panicked");
                    AuthResult::Failed(AuthError::Aborted("authentication flow panicked".into()))
                }
            };
            match &result {
                AuthResult::Authenticated(_) => tracing::info!("authentication succeeded"),
                AuthResult::Failed(e) => tracing::info!(error = %e, "authentication failed"),
            }
            result
        }
        .boxed()
        .shared();

        slot.flight = Some(flight.clone());
        drop(slot);

        if let Ok(runtime) = Handle::try_current() {
            runtime.spawn(flight.clone().map(drop));
        }
        flight
    }

    fn current(&self) -> Option<Flight> {
        lock(&self.slot).flight.clone()
    }

    /// Returns `true` while a handshake is registered.
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).flight.is_some()
    }

    /// Forgets the pending handshake (used on sign-out).
    ///
    /// The in-flight call is not cancelled. Callers already waiting on it
    /// still get its result, but the next `authenticate()` starts fresh.
    pub fn reset(&self) {
        let dangling = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.flight.take()
        };
        if dangling.is_some() {
            tracing::debug!("pending authentication detached");
        }
        // Dropped outside the lock: if this was the last handle, dropping
        // it runs the flight's guard, which locks the slot.
        drop(dangling);
    }
}

impl std::fmt::Debug for AuthCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCoordinator")
            .field("pending", &self.is_pending())
            .finish()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the slot when the flight finishes or is dropped.
struct PendingGuard {
    slot: Arc<Mutex<Slot>>,
    generation: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let finished = {
            let mut slot = lock(&self.slot);
            if slot.generation == self.generation {
                slot.flight.take()
            } else {
                None
            }
        };
        drop(finished);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::future::join_all;
    use tokio::sync::oneshot;

    use super::*;

    fn token(value: &str) -> SessionToken {
        SessionToken::new(value)
    }

    #[tokio::test]
    async fn test_authenticate_concurrent_callers_share_one_flow() {
        let coordinator = AuthCoordinator::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();

        let first = {
            let runs = Arc::clone(&runs);
            coordinator.authenticate(move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                let _ = gate.await;
                Ok(token("t1"))
            })
        };
        let joiners: Vec<_> = (0..9)
            .map(|_| {
                let runs = Arc::clone(&runs);
                coordinator.authenticate(move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(token("never"))
                })
            })
            .collect();
        assert!(coordinator.is_pending());

        release.send(()).unwrap();
        let first = first.await;
        let rest = join_all(joiners).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(first, AuthResult::Authenticated(token("t1")));
        assert!(rest.iter().all(|r| *r == first));
        assert!(!coordinator.is_pending());
    }

    #[tokio::test]
    async fn test_authenticate_after_settle_starts_new_flow() {
        let coordinator = AuthCoordinator::new();

        let first = coordinator.authenticate(|| async { Err(AuthError::NoIdentity) }).await;
        let second = coordinator.authenticate(|| async { Ok(token("t2")) }).await;

        assert_eq!(first, AuthResult::Failed(AuthError::NoIdentity));
        assert_eq!(second.token(), Some(&token("t2")));
    }

    #[tokio::test]
    async fn test_authenticate_panicking_flow_fails_and_clears_slot() {
        let coordinator = AuthCoordinator::new();

        async fn explode() -> Result<SessionToken, AuthError> {
            panic!("boom")
        }

        let result = coordinator.authenticate(explode).await;

        assert!(matches!(result, AuthResult::Failed(AuthError::Aborted(_))));
        assert!(!coordinator.is_pending());
    }

    #[tokio::test]
    async fn test_reset_detaches_flight_without_cancelling_it() {
        let coordinator = AuthCoordinator::new();
        let (release, gate) = oneshot::channel::<()>();
        let waiting = coordinator.authenticate(move || async move {
            let _ = gate.await;
            Ok(token("old"))
        });

        coordinator.reset();
        assert!(!coordinator.is_pending());

        // A fresh call starts a new flight instead of joining the old one.
        let fresh = coordinator.authenticate(|| async { Ok(token("new")) }).await;
        assert_eq!(fresh.token(), Some(&token("new")));

        release.send(()).unwrap();
        assert_eq!(waiting.await.token(), Some(&token("old")));
    }

    #[tokio::test]
    async fn test_reset_old_flight_does_not_clear_new_one() {
        let coordinator = AuthCoordinator::new();
        let (release_old, old_gate) = oneshot::channel::<()>();
        let (release_new, new_gate) = oneshot::channel::<()>();

        let old = coordinator.authenticate(move || async move {
            let _ = old_gate.await;
            Ok(token("old"))
        });
        coordinator.reset();
        let new = coordinator.authenticate(move || async move {
            let _ = new_gate.await;
            Ok(token("new"))
        });

        release_old.send(()).unwrap();
        old.await;
        assert!(coordinator.is_pending());

        release_new.send(()).unwrap();
        new.await;
        assert!(!coordinator.is_pending());
    }

    #[test]
    fn test_auth_result_accessors() {
        let ok = AuthResult::Authenticated(token("t"));
        let err = AuthResult::Failed(AuthError::SessionExpired);

        assert!(ok.is_success());
        assert_eq!(ok.error(), None);
        assert_eq!(err.token(), None);
        assert_eq!(err.into_result(), Err(AuthError::SessionExpired));
    }

    #[tokio::test]
    async fn test_authenticate_flow_factory_may_query_coordinator() {
        let coordinator = AuthCoordinator::new();
        let inner = coordinator.clone();

        let result = coordinator
            .authenticate(move || {
                let pending_while_building = inner.is_pending();
                async move {
                    assert!(!pending_while_building);
                    Ok(token("t1"))
                }
            })
            .await;

        assert_eq!(result.token(), Some(&token("t1")));
    }

    #[tokio::test]
    async fn test_authenticate_dropped_caller_still_completes_flight() {
        let coordinator = AuthCoordinator::new();
        let (finished, done) = oneshot::channel::<()>();

        drop(coordinator.authenticate(move || async move {
            let _ = finished.send(());
            Ok(token("t1"))
        }));

        done.await.expect("flight should run without a caller");
        tokio::task::yield_now().await;
        assert!(!coordinator.is_pending());
    }
}
