//! Error types for the session layer.

use daogate_protocol::ProtocolError;

/// Errors that can occur while reading or writing persisted credentials.
///
/// The [`CredentialStore`](crate::CredentialStore) never surfaces these to
/// its callers: a failed write is logged and the in-memory credential
/// stays authoritative for the rest of the process. Storage backends
/// return them so the store can decide.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The storage backend could not be read or written.
    #[error("credential storage failed: {0}")]
    Storage(#[source] std::io::Error),

    /// A persisted entry exists but can't be decoded.
    #[error("corrupt credential storage: {0}")]
    Corrupt(#[from] ProtocolError),
}

/// Errors reported by a connected wallet.
///
/// `Clone` because wallet failures end up inside the authentication
/// result that every concurrent caller receives a copy of.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user dismissed or declined the wallet prompt.
    #[error("request rejected by user: {0}")]
    Rejected(String),

    /// No account is connected.
    #[error("wallet not connected")]
    NotConnected,

    /// The wallet provider failed for any other reason.
    #[error("wallet provider error: {0}")]
    Provider(String),
}
