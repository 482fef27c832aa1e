//! Value types and wire formats for daogate.
//!
//! This crate defines the "vocabulary" shared by every other layer:
//!
//! - **Types** ([`Address`], [`ChainId`], [`Nonce`], [`Signature`],
//!   [`SessionToken`]): small newtypes that keep identities and
//!   credentials from being mixed up.
//! - **Sign-in message** ([`SignInMessage`]): the canonical plaintext a
//!   wallet signs during the challenge-response handshake. It must be
//!   reproducible byte-for-byte by both the client and the verifier.
//! - **GraphQL envelopes** ([`GraphQlRequest`], [`GraphQlResponse`]): the
//!   request/response shapes handed to the transport.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how values are turned
//!   into bytes (used for persisted credentials and request bodies).
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about wallets, sessions, or retries.
//! It only knows how to validate, compose, and parse values.
//!
//! ```text
//! Transport (GraphQL) → Protocol (values) ← Session / Auth (state)
//! ```

mod codec;
mod error;
mod graphql;
mod message;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use graphql::{GraphQlError, GraphQlRequest, GraphQlResponse};
pub use message::SignInMessage;
pub use types::{Address, ChainId, Nonce, SessionToken, Signature};
