//! Session state for daogate.
//!
//! This crate owns everything that answers "who is signed in, and with
//! which token?":
//!
//! 1. **Credential store**: the persisted token and bound address,
//!    with subscriber notification ([`CredentialStore`])
//! 2. **Delegated login**: a token/address pair handed over through URL
//!    parameters, consumed once and stripped ([`apply_url_delegation`])
//! 3. **Identity resolution**: strict precedence between a delegated
//!    identity and the connected wallet ([`AuthMode`])
//! 4. **Wallet seam**: what the core needs from a wallet ([`Wallet`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Auth Layer (above)     ← reads/writes tokens, asks the wallet to sign
//!     ↕
//! Session Layer (this crate)  ← credential state and identity
//!     ↕
//! Protocol Layer (below) ← Address, SessionToken
//! ```

#![allow(async_fn_in_trait)]

mod credential;
mod delegation;
mod error;
mod identity;
mod storage;
mod store;
mod wallet;

pub use credential::Credential;
pub use delegation::{
    ADDRESS_PARAM, AddressBar, DelegatedLogin, MemoryAddressBar, TOKEN_PARAM,
    apply_url_delegation, take_delegated_login,
};
pub use error::{SessionError, WalletError};
pub use identity::AuthMode;
pub use storage::{CredentialStorage, JsonFileStorage, MemoryStorage, StorageKey};
pub use store::CredentialStore;
pub use wallet::{Wallet, WalletAccount};
