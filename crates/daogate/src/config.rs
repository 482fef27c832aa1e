//! Client configuration.

use std::ops::RangeInclusive;
use std::path::Path;

use daogate_auth::{ExecOptions, SignInParams};
use daogate_protocol::SignInMessage;
use serde::{Deserialize, Serialize};

use crate::DaogateError;

/// Allowed nonce lengths in bytes.
pub const NONCE_LENGTH_RANGE: RangeInclusive<u32> = 8..=64;

/// Settings for a [`DaoClient`](crate::DaoClient).
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```json
/// { "domain": "gov.example.org", "uri": "https://gov.example.org" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host shown in the sign-in message.
    pub domain: String,

    /// Origin URI shown in the sign-in message.
    pub uri: String,

    /// The statement the user is asked to sign.
    pub statement: String,

    /// Sign-in message format version.
    pub version: String,

    /// Requested nonce length in bytes.
    pub nonce_length: u32,

    /// Sign in automatically when a protected request has no usable token.
    pub auto_auth: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let params = SignInParams::default();
        Self {
            domain: params.domain,
            uri: params.uri,
            statement: params.statement,
            version: params.version,
            nonce_length: params.nonce_length,
            auto_auth: true,
        }
    }
}

impl ClientConfig {
    /// Parses a JSON config.
    pub fn from_json(json: &str) -> Result<Self, DaogateError> {
        serde_json::from_str(json).map_err(|e| DaogateError::Config(e.to_string()))
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DaogateError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DaogateError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Brings out-of-range values back into range and folds a multi-line
    /// statement onto one line.
    pub fn validated(mut self) -> Self {
        let clamped = self
            .nonce_length
            .clamp(*NONCE_LENGTH_RANGE.start(), *NONCE_LENGTH_RANGE.end());
        if clamped != self.nonce_length {
            tracing::warn!(requested = self.nonce_length, using = clamped, "nonce length out of range");
            self.nonce_length = clamped;
        }
        if self.version.trim().is_empty() {
            self.version = "1".to_string();
        }
        let statement = SignInMessage::single_line_statement(&self.statement);
        if statement != self.statement {
            tracing::warn!(%statement, "sign-in statement folded onto one line");
            self.statement = statement;
        }
        self
    }

    pub fn sign_in_params(&self) -> SignInParams {
        SignInParams {
            domain: self.domain.clone(),
            uri: self.uri.clone(),
            statement: self.statement.clone(),
            version: self.version.clone(),
            nonce_length: self.nonce_length,
        }
    }

    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            auto_auth: self.auto_auth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_fills_missing_fields_with_defaults() {
        let config = ClientConfig::from_json(r#"{ "domain": "gov.example.org" }"#).unwrap();

        assert_eq!(config.domain, "gov.example.org");
        assert_eq!(config.version, "1");
        assert_eq!(config.nonce_length, 32);
        assert!(config.auto_auth);
    }

    #[test]
    fn test_from_json_invalid_is_config_error() {
        let result = ClientConfig::from_json("{ not json");

        assert!(matches!(result, Err(DaogateError::Config(_))));
    }

    #[test]
    fn test_from_file_missing_is_config_error() {
        let result = ClientConfig::from_file("/definitely/not/here/daogate.json");

        assert!(matches!(result, Err(DaogateError::Config(_))));
    }

    #[test]
    fn test_validated_clamps_nonce_length_and_fills_version() {
        let config = ClientConfig {
            nonce_length: 4096,
            version: "  ".into(),
            ..ClientConfig::default()
        }
        .validated();

        assert_eq!(config.nonce_length, 64);
        assert_eq!(config.version, "1");
        assert_eq!(
            ClientConfig {
                nonce_length: 0,
                ..ClientConfig::default()
            }
            .validated()
            .nonce_length,
            8
        );
    }

    #[test]
    fn test_sign_in_params_and_exec_options_follow_config() {
        let config = ClientConfig {
            statement: "Vote.".into(),
            auto_auth: false,
            ..ClientConfig::default()
        };

        assert_eq!(config.sign_in_params().statement, "Vote.");
        assert!(!config.exec_options().auto_auth);
    }

    #[test]
    fn test_validated_folds_multiline_statement() {
        let config = ClientConfig {
            statement: "Sign in.\nVote safely.".into(),
            ..ClientConfig::default()
        }
        .validated();

        assert_eq!(config.statement, "Sign in. Vote safely.");
        assert_eq!(ClientConfig::default().validated(), ClientConfig::default());
    }
}
