//! Identity resolution: who is the current actor?
//!
//! Two sources can name an actor: the connected wallet and a delegated
//! login. They are never merged. Precedence is strict:
//!
//! ```text
//! delegated address + token  →  Delegated   (wallet ignored entirely)
//! wallet connected           →  Wallet
//! otherwise                  →  None
//! ```
//!
//! The result is recomputed from live inputs on every read and never
//! cached, so it can't go stale when either source changes.

use daogate_protocol::Address;

use crate::{Credential, Wallet};

/// The effective authentication mode, carrying the actor's address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// A delegated identity supplied out-of-band is active.
    Delegated(Address),
    /// A wallet is connected and no delegated identity is active.
    Wallet(Address),
    /// Nobody is signed in or connected.
    None,
}

impl AuthMode {
    /// Resolves the mode from raw inputs.
    ///
    /// Pure: evaluating it never touches the credential store.
    ///
    /// # Arguments
    /// - `wallet_connected`: whether the wallet reports a connection
    /// - `wallet_address`: the wallet's current account, if any
    /// - `credential`: the store's current value
    pub fn resolve(
        wallet_connected: bool,
        wallet_address: Option<&Address>,
        credential: &Credential,
    ) -> Self {
        if credential.has_delegation() {
            if let Some(delegated) = &credential.delegated_address {
                return Self::Delegated(delegated.clone());
            }
        }
        match (wallet_connected, wallet_address) {
            (true, Some(address)) => Self::Wallet(address.clone()),
            _ => Self::None,
        }
    }

    /// Resolves the mode against a live wallet.
    pub fn current<W: Wallet>(wallet: &W, credential: &Credential) -> Self {
        let account = wallet.account();
        Self::resolve(
            account.is_some(),
            account.as_ref().map(|a| &a.address),
            credential,
        )
    }

    /// The effective actor address.
    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Delegated(address) | Self::Wallet(address) => Some(address),
            Self::None => None,
        }
    }

    /// Returns `true` if some actor is present (delegated or wallet).
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns `true` in delegated mode.
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::Delegated(_))
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delegated(_) => write!(f, "Delegated"),
            Self::Wallet(_) => write!(f, "Wallet"),
            Self::None => write!(f, "None"),
        }
    }
}
