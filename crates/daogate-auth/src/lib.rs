//! Authentication for daogate.
//!
//! This crate turns a connected wallet into a session token and keeps
//! protected requests supplied with one:
//!
//! 1. **Handshake**: nonce, sign-in message, signature, verification
//!    ([`ChallengeResponse`])
//! 2. **Single flight**: at most one handshake at a time, shared by every
//!    caller ([`AuthCoordinator`], [`AuthService`])
//! 3. **Execution**: run a request with the current token and recover
//!    from one expiry transparently ([`AuthExecutor`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Mutation Layer (above)  ← sends optimistic writes through the executor
//!     ↕
//! Auth Layer (this crate)  ← obtains and refreshes session tokens
//!     ↕
//! Session Layer (below)  ← stores the credential, knows the wallet
//! ```

#![allow(async_fn_in_trait)]

mod api;
mod coordinator;
mod error;
mod executor;
mod flow;
mod service;

pub use api::{AuthApi, GraphQlAuthApi};
pub use coordinator::{AuthCoordinator, AuthResult};
pub use error::{AuthError, AuthorizationFailure, ExecError};
pub use executor::{AuthExecutor, ExecOptions};
pub use flow::{ChallengeResponse, FlowStage, SignInParams};
pub use service::{AuthService, Authenticator};
