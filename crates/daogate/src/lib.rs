//! # daogate
//!
//! Wallet sign-in and session consistency for DAO governance clients.
//!
//! daogate signs users in with their wallet (nonce, signed message,
//! session token), keeps at most one sign-in in flight no matter how many
//! call sites ask, lets a delegated login link take over from the wallet,
//! transparently re-authenticates once when a session expires, and shows
//! user actions optimistically with rollback on failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daogate::prelude::*;
//!
//! // Implement Wallet and Transport for your environment, then:
//! // let client = DaoClient::builder()
//! //     .config(ClientConfig::from_file("daogate.json")?)
//! //     .build(wallet, transport);
//! // client.set_proposal_liked("proposal-1", true).await;
//! ```

#![allow(async_fn_in_trait)]

mod client;
mod config;
mod error;
pub mod likes;
pub mod logging;

pub use client::{DaoClient, DaoClientBuilder};
pub use config::{ClientConfig, NONCE_LENGTH_RANGE};
pub use error::DaogateError;

pub use daogate_auth as auth;
pub use daogate_mutation as mutation;
pub use daogate_protocol as protocol;
pub use daogate_session as session;
pub use daogate_transport as transport;

/// Everything a host needs to wire up a client.
pub mod prelude {
    pub use crate::likes::{AUTHENTICATED_VIEW, PUBLIC_VIEW, ProposalId, ProposalLikes};
    pub use crate::{ClientConfig, DaoClient, DaoClientBuilder, DaogateError};

    pub use daogate_auth::{AuthError, AuthResult};
    pub use daogate_mutation::{Notifier, ToggleOutcome, TracingNotifier};
    pub use daogate_protocol::{
        Address, ChainId, GraphQlError, GraphQlRequest, GraphQlResponse, SessionToken, Signature,
    };
    pub use daogate_session::{
        AddressBar, AuthMode, Credential, JsonFileStorage, MemoryAddressBar, MemoryStorage,
        Wallet, WalletAccount, WalletError,
    };
    pub use daogate_transport::{Transport, TransportError};
}
