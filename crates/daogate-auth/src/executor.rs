//! Running protected requests with automatic re-authentication.
//!
//! [`AuthExecutor::execute`] wraps any request that needs a session
//! token:
//!
//! 1. Use the stored token, or authenticate if there is none.
//! 2. Run the request.
//! 3. On an authorization failure, drop the token, authenticate once more
//!    and retry once.
//! 4. A second authorization failure is terminal:
//!    [`ExecError::SessionExpired`].
//!
//! The retry budget is tracked by a two-state machine rather than by
//! nesting, so there is no path to a third attempt.

use std::future::Future;
use std::sync::Arc;

use daogate_protocol::SessionToken;
use daogate_session::CredentialStore;

use crate::{AuthError, AuthorizationFailure, Authenticator, ExecError};

/// Per-call executor behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    /// Start a sign-in handshake when no usable token is available. When
    /// `false`, a missing token fails fast and a rejected token is
    /// reported as expired without re-authenticating.
    pub auto_auth: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self { auto_auth: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryState {
    NotAttempted,
    Retried,
}

/// Runs requests with the current session token, re-authenticating at
/// most once per request.
pub struct AuthExecutor<A> {
    store: CredentialStore,
    authenticator: Arc<A>,
    options: ExecOptions,
}

impl<A> Clone for AuthExecutor<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            authenticator: Arc::clone(&self.authenticator),
            options: self.options,
        }
    }
}

impl<A: Authenticator> AuthExecutor<A> {
    pub fn new(store: CredentialStore, authenticator: Arc<A>) -> Self {
        Self {
            store,
            authenticator,
            options: ExecOptions::default(),
        }
    }

    /// Replaces the default options used by [`execute`](Self::execute).
    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ExecOptions {
        self.options
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn authenticator(&self) -> &Arc<A> {
        &self.authenticator
    }

    /// Runs `request` with the executor's default options.
    ///
    /// `request` may be called twice (the original attempt and the single
    /// retry), each time with the token to present.
    ///
    /// # Errors
    /// - [`ExecError::AuthenticationRequired`]: no token could be obtained
    /// - [`ExecError::SessionExpired`]: rejected again after the retry
    ///   (or rejected once with `auto_auth` off)
    /// - [`ExecError::Request`]: any other failure, untouched
    pub async fn execute<R, E, F, Fut>(&self, request: F) -> Result<R, ExecError<E>>
    where
        F: FnMut(SessionToken) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: AuthorizationFailure,
    {
        self.execute_with(self.options, request).await
    }

    /// Like [`execute`](Self::execute) with explicit options.
    pub async fn execute_with<R, E, F, Fut>(
        &self,
        options: ExecOptions,
        mut request: F,
    ) -> Result<R, ExecError<E>>
    where
        F: FnMut(SessionToken) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: AuthorizationFailure,
    {
        let mut token = match self.store.token() {
            Some(token) => token,
            None if options.auto_auth => self.acquire().await?,
            None => return Err(ExecError::AuthenticationRequired(AuthError::NotSignedIn)),
        };
        let mut state = RetryState::NotAttempted;

        loop {
            match request(token.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_unauthorized() => return Err(ExecError::Request(e)),
                Err(_) => {}
            }

            self.store.discard_token(&token);
            if state == RetryState::Retried || !options.auto_auth {
                tracing::warn!(?state, auto_auth = options.auto_auth, "session rejected, giving up");
                return Err(ExecError::SessionExpired);
            }
            state = RetryState::Retried;

            token = match self.store.token() {
                // Someone else re-authenticated while this request was in
                // flight; their token hasn't been tried yet.
                Some(fresh) => {
                    tracing::debug!("retrying with a token refreshed elsewhere");
                    fresh
                }
                None => {
                    tracing::info!("session rejected, re-authenticating once");
                    self.acquire().await?
                }
            };
        }
    }

    async fn acquire<E>(&self) -> Result<SessionToken, ExecError<E>> {
        self.authenticator
            .authenticate()
            .await
            .into_result()
            .map_err(ExecError::AuthenticationRequired)
    }
}

// =========================================================================
// Tests
// =========================================================================
