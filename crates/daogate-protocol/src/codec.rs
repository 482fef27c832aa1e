//! Codec trait and implementations for serializing values to bytes.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The credential storage backends and transports don't care HOW values
//! are serialized: they just need something that implements [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between tasks.
/// - `'static` → the codec owns everything it needs, so it can live
///   inside long-lived stores.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what both the GraphQL endpoint and browser local storage speak,
/// so it is the only codec daogate needs.
///
/// ## Example
///
/// ```rust
/// use daogate_protocol::{Address, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let address = Address::parse("0x52908400098527886E0F7030069857D2E4169EE7").unwrap();
///
/// let bytes = codec.encode(&address).unwrap();
/// let decoded: Address = codec.decode(&bytes).unwrap();
/// assert_eq!(address, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
