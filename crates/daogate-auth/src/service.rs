//! The `Authenticator` seam and its production implementation.

use std::future::Future;
use std::sync::Arc;

use daogate_session::Wallet;

use crate::{AuthApi, AuthCoordinator, AuthResult, ChallengeResponse};

/// Anything that can produce a fresh session token on demand.
///
/// The [`AuthExecutor`](crate::AuthExecutor) only depends on this trait,
/// so tests can drive it with a scripted authenticator and no wallet.
///
/// Implementations must be safe to call concurrently and must never fail
/// with a panic or an `Err`: every outcome is an [`AuthResult`].
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self) -> impl Future<Output = AuthResult> + Send;
}

/// Sign-in handshakes deduplicated through an [`AuthCoordinator`].
pub struct AuthService<W, A> {
    flow: Arc<ChallengeResponse<W, A>>,
    coordinator: AuthCoordinator,
}

impl<W: Wallet, A: AuthApi> AuthService<W, A> {
    pub fn new(flow: ChallengeResponse<W, A>) -> Self {
        Self::with_coordinator(flow, AuthCoordinator::new())
    }

    /// Shares an existing coordinator, e.g. one also used by another
    /// service talking to the same backend.
    pub fn with_coordinator(flow: ChallengeResponse<W, A>, coordinator: AuthCoordinator) -> Self {
        Self {
            flow: Arc::new(flow),
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &AuthCoordinator {
        &self.coordinator
    }

    pub fn is_pending(&self) -> bool {
        self.coordinator.is_pending()
    }

    /// Detaches any in-flight handshake. See [`AuthCoordinator::reset`].
    pub fn reset(&self) {
        self.coordinator.reset();
    }
}

impl<W: Wallet, A: AuthApi> Authenticator for AuthService<W, A> {
    fn authenticate(&self) -> impl Future<Output = AuthResult> + Send {
        let flow = Arc::clone(&self.flow);
        self.coordinator.authenticate(move || async move { flow.run().await })
    }
}
