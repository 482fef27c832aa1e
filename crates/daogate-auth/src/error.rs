//! Error types for the authentication layer.

use daogate_transport::TransportError;

/// Why an authentication attempt failed.
///
/// `Clone` because a single handshake's outcome is handed to every caller
/// that was waiting on it. Payloads are plain strings for the same reason:
/// the underlying transport and wallet errors are not `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No connected wallet account to sign in with. Raised before any
    /// network call.
    #[error("no connected wallet account to sign in with")]
    NoIdentity,

    /// No session token and automatic sign-in is disabled.
    #[error("not signed in")]
    NotSignedIn,

    /// The nonce request failed. The reason is kept for logs; the
    /// user-facing message is fixed.
    #[error("Failed to get nonce")]
    NonceFetch(String),

    /// The user declined the signing prompt. Never retried automatically.
    #[error("signature request cancelled by user")]
    SignatureRejected,

    /// The wallet failed to sign for a reason other than the user
    /// declining.
    #[error("wallet error: {0}")]
    Wallet(String),

    /// The server rejected the message/signature or returned no token.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// The session was rejected again right after re-authenticating.
    #[error("session expired, reconnect your wallet")]
    SessionExpired,

    /// Any other transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The handshake panicked, or its result was discarded by a sign-out.
    #[error("authentication aborted: {0}")]
    Aborted(String),
}

impl AuthError {
    /// Returns `true` if the user deliberately cancelled. UIs should treat
    /// this as a silent no-op rather than an error dialog.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, Self::SignatureRejected)
    }
}

impl From<TransportError> for AuthError {
    fn from(e: TransportError) -> Self {
        Self::Network(e.to_string())
    }
}

/// Errors returned by the [`AuthExecutor`](crate::AuthExecutor).
///
/// Only two cases originate in the executor; every other request failure
/// passes through untouched as [`ExecError::Request`].
#[derive(Debug, thiserror::Error)]
pub enum ExecError<E> {
    /// No token could be obtained.
    #[error("authentication required: {0}")]
    AuthenticationRequired(AuthError),

    /// The request was rejected as unauthorized again after the single
    /// re-authentication.
    #[error("session expired, reconnect your wallet")]
    SessionExpired,

    /// The request itself failed for a reason unrelated to authorization.
    #[error(transparent)]
    Request(E),
}

impl<E> ExecError<E> {
    /// Returns `true` if the failure came from a declined signing prompt.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, Self::AuthenticationRequired(e) if e.is_user_cancelled())
    }
}

/// Classifies a request failure as "the session token was rejected".
///
/// Only failures answering `true` trigger the executor's
/// clear-token-and-re-authenticate path.
pub trait AuthorizationFailure {
    fn is_unauthorized(&self) -> bool;
}

impl AuthorizationFailure for TransportError {
    fn is_unauthorized(&self) -> bool {
        TransportError::is_unauthorized(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_fetch_message_is_fixed() {
        let err = AuthError::NonceFetch("connection refused".into());

        assert_eq!(err.to_string(), "Failed to get nonce");
    }

    #[test]
    fn test_signature_rejected_mentions_cancelled_by_user() {
        let err = AuthError::SignatureRejected;

        assert!(err.to_string().contains("cancelled by user"));
        assert!(err.is_user_cancelled());
    }

    #[test]
    fn test_exec_error_user_cancelled_passes_through() {
        let err: ExecError<TransportError> =
            ExecError::AuthenticationRequired(AuthError::SignatureRejected);

        assert!(err.is_user_cancelled());
        assert!(!ExecError::<TransportError>::SessionExpired.is_user_cancelled());
    }

    #[test]
    fn test_transport_unauthorized_is_authorization_failure() {
        assert!(AuthorizationFailure::is_unauthorized(&TransportError::Unauthorized));
        assert!(!AuthorizationFailure::is_unauthorized(&TransportError::Network(
            "reset".into()
        )));
    }
}
