//! Error types for the transport layer.

use daogate_protocol::ProtocolError;

/// Errors that can occur while executing a GraphQL request.
///
/// Only [`TransportError::Unauthorized`] triggers re-authentication
/// upstream; every other variant passes through to the caller untouched.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server rejected the bearer credential: an HTTP 401, or a
    /// GraphQL error flagged as an authorization failure.
    #[error("unauthorized")]
    Unauthorized,

    /// The server answered with a non-success HTTP status other than 401.
    #[error("http status {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, connection reset,
    /// timeout enforced by the underlying client, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The operation reached the server and was rejected for reasons
    /// unrelated to authorization (GraphQL `errors` array).
    #[error("request rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),

    /// The response body was not what the operation expects.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// Maps an HTTP status to an error. 401 is the sole status that
    /// becomes [`TransportError::Unauthorized`].
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == 401 {
            Self::Unauthorized
        } else {
            Self::Http {
                status,
                message: message.into(),
            }
        }
    }

    /// Returns `true` if this failure should trigger re-authentication.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
