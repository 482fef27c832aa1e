//! Identity and credential newtypes.
//!
//! Every value here is a "newtype wrapper" around a primitive. The wrapper
//! makes it impossible to pass a nonce where a session token is expected,
//! even though both are strings underneath, and gives each type a place to
//! enforce its own validity rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An EVM account address: `0x` followed by exactly 40 hex digits.
///
/// The address keeps the letter case it was created with. Checksummed
/// (mixed-case) addresses are common, and the sign-in message must embed
/// the address exactly as supplied for the verifier to reproduce it.
///
/// `#[serde(try_from = "String")]` routes deserialization through
/// [`Address::parse`], so an invalid address can never be decoded from
/// persisted storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Total length of a valid address, including the `0x` prefix.
    pub const LEN: usize = 42;

    /// Validates and wraps an address string.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidAddress`] unless the input is `0x`
    /// followed by 40 ASCII hex digits.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if Self::is_valid(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ProtocolError::InvalidAddress(raw.to_string()))
        }
    }

    /// Returns `true` if `raw` matches `^0x[0-9a-fA-F]{40}$`.
    pub fn is_valid(raw: &str) -> bool {
        raw.len() == Self::LEN
            && raw.starts_with("0x")
            && raw[2..].bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Returns the address exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares two addresses ignoring hex letter case.
    pub fn eq_ignore_case(&self, other: &Address) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl TryFrom<String> for Address {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(ProtocolError::InvalidAddress(value))
        }
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// An EIP-155 chain identifier (1 = Ethereum mainnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Nonce / Signature
// ---------------------------------------------------------------------------

/// A single-use challenge issued by the server. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(pub String);

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wallet signature over a sign-in message, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// SessionToken
// ---------------------------------------------------------------------------

/// An opaque session credential issued after a successful sign-in.
///
/// `Debug` is implemented by hand so the secret never ends up in logs:
/// `{:?}` prints `SessionToken(***)`. Use [`SessionToken::as_str`] when
/// the raw value is genuinely needed (the `Authorization` header).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats the token as an HTTP bearer credential.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    #[test]
    fn test_parse_checksummed_address_preserves_case() {
        let address = Address::parse(CHECKSUMMED).expect("valid address");

        assert_eq!(address.as_str(), CHECKSUMMED);
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let raw = &CHECKSUMMED[2..];

        assert!(matches!(
            Address::parse(raw),
            Err(ProtocolError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_length_and_non_hex() {
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse(&format!("{CHECKSUMMED}0")).is_err());
        assert!(Address::parse("0xZZ908400098527886E0F7030069857D2E4169EE7").is_err());
    }

    #[test]
    fn test_eq_ignore_case_matches_lowercased_form() {
        let mixed = Address::parse(CHECKSUMMED).unwrap();
        let lower = Address::parse(&CHECKSUMMED.to_lowercase()).unwrap();

        assert_ne!(mixed, lower);
        assert!(mixed.eq_ignore_case(&lower));
    }

    #[test]
    fn test_deserialize_invalid_address_fails() {
        let result: Result<Address, _> = serde_json::from_str("\"0xnope\"");

        assert!(result.is_err());
    }

    #[test]
    fn test_session_token_debug_is_redacted() {
        let token = SessionToken::new("super-secret");

        let printed = format!("{token:?}");

        assert!(!printed.contains("super-secret"));
        assert_eq!(token.bearer(), "Bearer super-secret");
    }
}
