//! The challenge-response sign-in handshake.
//!
//! ```text
//! Idle ──→ NonceRequested ──→ MessageSigned ──→ Verified
//! ```
//!
//! 1. Require a connected wallet account (address + chain id).
//! 2. Ask the server for a single-use nonce.
//! 3. Render the canonical [`SignInMessage`].
//! 4. Ask the wallet to sign that exact text.
//! 5. Submit `{ message, signature }`; receive a session token.
//! 6. Persist the token, bound to the address written into the signed
//!    message.
//!
//! Any failure short-circuits. Nothing is persisted before step 6.

use std::sync::Arc;

use daogate_protocol::{SessionToken, SignInMessage};
use daogate_session::{CredentialStore, Wallet, WalletError};

use crate::{AuthApi, AuthError};

// ---------------------------------------------------------------------------
// SignInParams
// ---------------------------------------------------------------------------

/// Application-chosen fields of the sign-in message.
#[derive(Debug, Clone)]
pub struct SignInParams {
    /// Origin host, e.g. `gov.example.org`.
    pub domain: String,
    /// Origin URI, e.g. `https://gov.example.org`.
    pub uri: String,
    /// Single-line statement shown in the wallet prompt.
    pub statement: String,
    /// Message format version.
    pub version: String,
    /// Requested nonce length in bytes.
    pub nonce_length: u32,
}

impl Default for SignInParams {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            uri: "http://localhost".to_string(),
            statement: "Sign in with Ethereum to the app.".to_string(),
            version: "1".to_string(),
            nonce_length: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// FlowStage
// ---------------------------------------------------------------------------

/// Progress of one handshake. Transitions are strictly sequential; there
/// is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Idle,
    NonceRequested,
    MessageSigned,
    Verified,
}

impl FlowStage {
    /// The only stage reachable from this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::NonceRequested),
            Self::NonceRequested => Some(Self::MessageSigned),
            Self::MessageSigned => Some(Self::Verified),
            Self::Verified => None,
        }
    }

    /// Returns `true` if moving to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for FlowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::NonceRequested => write!(f, "NonceRequested"),
            Self::MessageSigned => write!(f, "MessageSigned"),
            Self::Verified => write!(f, "Verified"),
        }
    }
}

// ---------------------------------------------------------------------------
// ChallengeResponse
// ---------------------------------------------------------------------------

/// Runs the sign-in handshake.
///
/// This type does no deduplication of its own: two concurrent calls to
/// [`run`](Self::run) perform two handshakes. Go through the
/// [`AuthCoordinator`](crate::AuthCoordinator) (or
/// [`AuthService`](crate::AuthService)) to get single-flight behavior.
pub struct ChallengeResponse<W, A> {
    wallet: Arc<W>,
    api: A,
    store: CredentialStore,
    params: SignInParams,
}

impl<W: Wallet, A: AuthApi> ChallengeResponse<W, A> {
    pub fn new(wallet: Arc<W>, api: A, store: CredentialStore, params: SignInParams) -> Self {
        Self {
            wallet,
            api,
            store,
            params,
        }
    }

    pub fn params(&self) -> &SignInParams {
        &self.params
    }

    /// Performs one complete handshake and persists the issued token.
    ///
    /// # Errors
    /// - [`AuthError::NoIdentity`]: no wallet account (no network call made)
    /// - [`AuthError::NonceFetch`]: the nonce request failed
    /// - [`AuthError::SignatureRejected`]: the user declined to sign
    ///   (the verification request is never sent)
    /// - [`AuthError::Wallet`]: signing failed otherwise
    /// - [`AuthError::VerificationFailed`]: login rejected or no token
    /// - [`AuthError::Aborted`]: a sign-out or delegated login happened
    ///   mid-handshake
    pub async fn run(&self) -> Result<SessionToken, AuthError> {
        let mut stage = FlowStage::Idle;
        let generation = self.store.generation();

        // --- Step 1: who is signing in? ---
        let account = self.wallet.account().ok_or(AuthError::NoIdentity)?;
        tracing::debug!(address = %account.address, chain_id = %account.chain_id, "starting sign-in");

        // --- Step 2: nonce ---
        let nonce = self.api.nonce(self.params.nonce_length).await.map_err(|e| {
            tracing::warn!(error = %e, "nonce request failed");
            AuthError::NonceFetch(e.to_string())
        })?;
        advance(&mut stage, FlowStage::NonceRequested);

        // --- Step 3 + 4: compose and sign ---
        let message = SignInMessage {
            domain: self.params.domain.clone(),
            address: account.address,
            statement: SignInMessage::single_line_statement(&self.params.statement),
            uri: self.params.uri.clone(),
            version: self.params.version.clone(),
            chain_id: account.chain_id,
            nonce,
        };
        // The token is bound to the address written in the signed body.
        let address = message.address.clone();
        let message = message.to_string();

        let signature = self.wallet.sign_message(&message).await.map_err(|e| match e {
            WalletError::Rejected(reason) => {
                tracing::info!(%reason, "sign-in cancelled by user");
                AuthError::SignatureRejected
            }
            other => {
                tracing::warn!(error = %other, "wallet failed to sign");
                AuthError::Wallet(other.to_string())
            }
        })?;
        advance(&mut stage, FlowStage::MessageSigned);

        // --- Step 5: verify ---
        let token = match self.api.login(&message, &signature).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "sign-in verification failed");
                self.store.clear_token();
                return Err(AuthError::VerificationFailed(e.to_string()));
            }
        };

        advance(&mut stage, FlowStage::Verified);

        // --- Step 6: persist ---
        if !self.store.set_session_if_current(generation, token.clone(), address) {
            return Err(AuthError::Aborted("session replaced during sign-in".into()));
        }
        Ok(token)
    }
}

fn advance(stage: &mut FlowStage, next: FlowStage) {
    debug_assert!(stage.can_transition_to(next), "invalid flow transition {stage} -> {next}");
    tracing::debug!(from = %stage, to = %next, "sign-in stage");
    *stage = next;
}

// =========================================================================
// Tests
// =========================================================================
