//! Transport abstraction for daogate.
//!
//! The GraphQL client itself (HTTP, marshaling, timeouts) lives outside
//! this workspace. This crate pins down the contract daogate needs from
//! it: the [`Transport`] trait, how a session token travels (as a bearer
//! credential), and which failures count as "unauthorized".
//!
//! # Classification
//!
//! [`Transport::request`] wraps the raw [`Transport::execute`] and folds a
//! response body into a `Result`:
//!
//! ```text
//! HTTP 401 or GraphQL error with UNAUTHENTICATED  → TransportError::Unauthorized
//! any other GraphQL error                          → TransportError::Rejected
//! data without errors                              → Ok(GraphQlResponse)
//! ```

#![allow(async_fn_in_trait)]

mod error;

pub use error::TransportError;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use daogate_protocol::{GraphQlRequest, GraphQlResponse, SessionToken};

/// Counter for generating unique request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier attached to each request for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocates the next process-unique request ID.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Executes GraphQL operations against the governance API.
///
/// Implementations send `bearer` as an `Authorization: Bearer <token>`
/// header when present, and must return [`TransportError::Unauthorized`]
/// for an HTTP 401 (see [`TransportError::from_status`]). A GraphQL body
/// with an `errors` array is returned as `Ok`; classification happens in
/// [`Transport::request`].
pub trait Transport: Send + Sync + 'static {
    /// Sends one operation and returns the decoded response body.
    fn execute(
        &self,
        request: GraphQlRequest,
        bearer: Option<SessionToken>,
    ) -> impl Future<Output = Result<GraphQlResponse, TransportError>> + Send;

    /// Sends one operation and classifies the response.
    ///
    /// # Errors
    /// - [`TransportError::Unauthorized`]: 401 or an authorization error
    ///   in the body
    /// - [`TransportError::Rejected`]: any other GraphQL error
    /// - whatever [`Transport::execute`] returned
    fn request(
        &self,
        request: GraphQlRequest,
        bearer: Option<SessionToken>,
    ) -> impl Future<Output = Result<GraphQlResponse, TransportError>> + Send {
        async move {
            let id = RequestId::next();
            let operation = request.operation_name.clone().unwrap_or_default();
            tracing::debug!(%id, %operation, authenticated = bearer.is_some(), "sending request");

            let response = self.execute(request, bearer).await.inspect_err(|e| {
                tracing::debug!(%id, %operation, error = %e, "request failed");
            })?;

            if response.is_unauthorized() {
                tracing::debug!(%id, %operation, "request unauthorized");
                return Err(TransportError::Unauthorized);
            }
            if !response.errors.is_empty() {
                let messages = response.errors.into_iter().map(|e| e.message).collect();
                return Err(TransportError::Rejected(messages));
            }
            Ok(response)
        }
    }
}
