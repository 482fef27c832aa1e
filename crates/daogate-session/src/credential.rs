//! The credential value held by the store.
//!
//! A credential records:
//! - WHICH session token to present on protected requests
//! - WHICH wallet address that token was issued to
//! - WHETHER the actor arrived through a delegated login link

use daogate_protocol::{Address, SessionToken};

/// The complete session credential.
///
/// At most one of `wallet_address` / `delegated_address` is authoritative
/// at a time. Which one is decided by
/// [`AuthMode::resolve`](crate::AuthMode::resolve), not by which field
/// happens to be set.
///
/// The store only ever replaces the whole value, so a reader never sees
/// a half-updated credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// The session token, if any.
    pub token: Option<SessionToken>,

    /// The wallet address the token is bound to.
    pub wallet_address: Option<Address>,

    /// The actor named by a delegated login link.
    ///
    /// Only set together with a token. Lives in memory only: a reload
    /// falls back to the persisted token and `wallet_address`.
    pub delegated_address: Option<Address>,
}

impl Credential {
    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.wallet_address.is_none() && self.delegated_address.is_none()
    }

    /// Returns `true` if a delegated identity is active: a delegated
    /// address bound to a token.
    pub fn has_delegation(&self) -> bool {
        self.delegated_address.is_some() && self.token.is_some()
    }

    /// The address the current token is bound to, whichever mode issued it.
    pub fn bound_address(&self) -> Option<&Address> {
        self.delegated_address.as_ref().or(self.wallet_address.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{}", format!("{n:02x}").repeat(20))).unwrap()
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Credential::default().is_empty());
    }

    #[test]
    fn test_has_delegation_requires_token() {
        let mut cred = Credential {
            delegated_address: Some(addr(1)),
            ..Credential::default()
        };
        assert!(!cred.has_delegation());

        cred.token = Some(SessionToken::new("t"));
        assert!(cred.has_delegation());
    }

    #[test]
    fn test_bound_address_prefers_delegated() {
        let cred = Credential {
            token: Some(SessionToken::new("t")),
            wallet_address: Some(addr(1)),
            delegated_address: Some(addr(2)),
        };

        assert_eq!(cred.bound_address(), Some(&addr(2)));
    }
}
