//! Error types for the protocol layer.
//!
//! Each daogate crate defines its own error enum. When you see a
//! `ProtocolError`, the problem is in validating, encoding, or parsing a
//! value, never in networking or session state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// persisted entry written by an incompatible version.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The string is not a `0x`-prefixed, 40-hex-digit account address.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// A sign-in message could not be parsed back into its fields.
    #[error("malformed sign-in message: {0}")]
    MalformedMessage(String),

    /// The message is structurally valid but violates a protocol rule,
    /// e.g. a GraphQL response carrying neither data nor errors.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
