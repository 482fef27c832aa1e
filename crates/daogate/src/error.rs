//! Unified error type for daogate.

use daogate_auth::{AuthError, ExecError};
use daogate_mutation::Notice;
use daogate_protocol::ProtocolError;
use daogate_session::SessionError;
use daogate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `daogate` facade you deal with this single error type
/// instead of importing errors from each sub-crate. `From` impls let the
/// `?` operator convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DaogateError {
    /// A transport-level error (network, HTTP status, bad body).
    #[error(transparent)]
    Transport(TransportError),

    /// A protocol-level error (invalid address, malformed message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-storage error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A sign-in attempt failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A protected request needed a session token and none could be
    /// obtained.
    #[error("authentication required: {0}")]
    AuthenticationRequired(AuthError),

    /// The session was rejected again after re-authenticating. The user
    /// has to reconnect.
    #[error("session expired, reconnect your wallet")]
    SessionExpired,

    /// The server refused a write for reasons unrelated to authorization.
    #[error("write rejected: {}", .0.join("; "))]
    MutationConflict(Vec<String>),

    /// The client configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DaogateError {
    /// Returns `true` if the user declined the wallet signing prompt.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Auth(e) | Self::AuthenticationRequired(e) if e.is_user_cancelled()
        )
    }
}

impl From<TransportError> for DaogateError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Rejected(messages) => Self::MutationConflict(messages),
            other => Self::Transport(other),
        }
    }
}

impl<E: Into<DaogateError>> From<ExecError<E>> for DaogateError {
    fn from(e: ExecError<E>) -> Self {
        match e {
            ExecError::AuthenticationRequired(auth) => Self::AuthenticationRequired(auth),
            ExecError::SessionExpired => Self::SessionExpired,
            ExecError::Request(inner) => inner.into(),
        }
    }
}

impl Notice for DaogateError {
    fn is_silent(&self) -> bool {
        self.is_user_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Network("connection reset".into());
        let daogate_err: DaogateError = err.into();
        assert!(matches!(daogate_err, DaogateError::Transport(_)));
        assert!(daogate_err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_from_rejected_transport_error_is_mutation_conflict() {
        let err = TransportError::Rejected(vec!["proposal closed".into()]);
        let daogate_err: DaogateError = err.into();
        assert!(matches!(daogate_err, DaogateError::MutationConflict(_)));
        assert_eq!(daogate_err.to_string(), "write rejected: proposal closed");
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidAddress("0x12".into());
        let daogate_err: DaogateError = err.into();
        assert!(matches!(daogate_err, DaogateError::Protocol(_)));
    }

    #[test]
    fn test_from_exec_error_maps_each_case() {
        let expired: DaogateError = ExecError::<TransportError>::SessionExpired.into();
        let required: DaogateError =
            ExecError::<TransportError>::AuthenticationRequired(AuthError::NoIdentity).into();
        let request: DaogateError =
            ExecError::Request(TransportError::Rejected(vec!["nope".into()])).into();

        assert!(matches!(expired, DaogateError::SessionExpired));
        assert!(matches!(required, DaogateError::AuthenticationRequired(AuthError::NoIdentity)));
        assert!(matches!(request, DaogateError::MutationConflict(_)));
    }

    #[test]
    fn test_user_cancelled_is_silent() {
        let err = DaogateError::AuthenticationRequired(AuthError::SignatureRejected);
        assert!(err.is_user_cancelled());
        assert!(err.is_silent());
        assert!(!DaogateError::SessionExpired.is_silent());
    }
}
