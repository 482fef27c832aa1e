//! The server side of the handshake: nonce issuance and login.

use std::future::Future;
use std::sync::Arc;

use daogate_protocol::{GraphQlRequest, Nonce, ProtocolError, SessionToken, Signature};
use daogate_transport::{Transport, TransportError};
use serde_json::json;

const NONCE_QUERY: &str = "query Nonce($length: Int!) { nonce(length: $length) }";

const LOGIN_MUTATION: &str = "mutation Login($message: String!, $signature: String!) { \
     login(message: $message, signature: $signature) { token } }";

/// The two calls the challenge-response flow makes to the server.
pub trait AuthApi: Send + Sync + 'static {
    /// Requests a single-use nonce of `length` bytes.
    fn nonce(&self, length: u32) -> impl Future<Output = Result<Nonce, TransportError>> + Send;

    /// Submits a signed message for verification and returns the issued
    /// session token.
    fn login(
        &self,
        message: &str,
        signature: &Signature,
    ) -> impl Future<Output = Result<SessionToken, TransportError>> + Send;
}

/// [`AuthApi`] over the governance GraphQL endpoint.
pub struct GraphQlAuthApi<T> {
    transport: Arc<T>,
}

impl<T: Transport> GraphQlAuthApi<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

impl<T: Transport> AuthApi for GraphQlAuthApi<T> {
    async fn nonce(&self, length: u32) -> Result<Nonce, TransportError> {
        let request = GraphQlRequest::new("Nonce", NONCE_QUERY, json!({ "length": length }));
        let response = self.transport.request(request, None).await?;

        let nonce = response
            .field("nonce")?
            .as_str()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ProtocolError::InvalidMessage("nonce is not a non-empty string".into()))?;
        Ok(Nonce(nonce.to_string()))
    }

    async fn login(&self, message: &str, signature: &Signature) -> Result<SessionToken, TransportError> {
        let request = GraphQlRequest::new(
            "Login",
            LOGIN_MUTATION,
            json!({ "message": message, "signature": signature.as_str() }),
        );
        let response = self.transport.request(request, None).await?;

        let token = response
            .field("login")?
            .get("token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProtocolError::InvalidMessage("login returned no token".into()))?;
        Ok(SessionToken::new(token))
    }
}
