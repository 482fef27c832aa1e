//! GraphQL request/response envelopes.
//!
//! The transport marshals these to and from HTTP bodies. Only the parts of
//! the GraphQL-over-HTTP format daogate relies on are modelled.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// A single GraphQL operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub variables: Value,
}

impl GraphQlRequest {
    /// Creates a named operation with the given variables object.
    pub fn new(operation_name: &str, query: &str, variables: Value) -> Self {
        Self {
            query: query.to_string(),
            operation_name: Some(operation_name.to_string()),
            variables,
        }
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: None,
        }
    }

    /// Returns `true` if the server flagged this error as an authorization
    /// failure: an `UNAUTHENTICATED`/`UNAUTHORIZED` extension code, or a
    /// message mentioning "unauthorized".
    pub fn is_unauthorized(&self) -> bool {
        let coded = self
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
            .is_some_and(|code| {
                code.eq_ignore_ascii_case("UNAUTHENTICATED")
                    || code.eq_ignore_ascii_case("UNAUTHORIZED")
            });
        coded || self.message.to_ascii_lowercase().contains("unauthorized")
    }
}

/// A GraphQL response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// A successful response carrying `data`.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A failed response carrying a single error.
    pub fn error(error: GraphQlError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    /// Returns `true` if any error in the body is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        self.errors.iter().any(GraphQlError::is_unauthorized)
    }

    /// Extracts `data.<field>` from a response without errors.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if the field is absent or
    /// null.
    pub fn field(&self, field: &str) -> Result<&Value, ProtocolError> {
        self.data
            .as_ref()
            .and_then(|data| data.get(field))
            .filter(|value| !value.is_null())
            .ok_or_else(|| ProtocolError::InvalidMessage(format!("response has no `{field}` field")))
    }
}
