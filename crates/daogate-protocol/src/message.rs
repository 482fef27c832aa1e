//! The canonical sign-in message signed during the handshake.
//!
//! The format follows the EIP-4361 ("Sign-In with Ethereum") layout:
//!
//! ```text
//! gov.example.org wants you to sign in with your Ethereum account:
//! 0x52908400098527886E0F7030069857D2E4169EE7
//!
//! Sign in to the governance dashboard.
//!
//! URI: https://gov.example.org
//! Version: 1
//! Chain ID: 1
//! Nonce: 8c1a0f3e
//! ```
//!
//! The verifier rebuilds this text from the same fields and checks the
//! signature against it, so the rendering is fixed: `\n` line endings, no
//! trailing newline, one blank line around the statement. The statement is
//! omitted (along with its surrounding blank line) when empty.

use std::fmt;

use crate::{Address, ChainId, Nonce, ProtocolError};

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const CHAIN_ID_TAG: &str = "Chain ID: ";
const NONCE_TAG: &str = "Nonce: ";

/// All fields of a sign-in message.
///
/// `statement` must be a single line; everything else is free-form text
/// chosen by the application except `address`, `chain_id`, and `nonce`,
/// which come from the wallet and the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInMessage {
    /// The origin's host (e.g. `gov.example.org`).
    pub domain: String,
    /// The account being signed in, embedded exactly as supplied.
    pub address: Address,
    /// Human-readable intent shown in the wallet prompt.
    pub statement: String,
    /// The origin URI (e.g. `https://gov.example.org`).
    pub uri: String,
    /// Message format version, `"1"` today.
    pub version: String,
    pub chain_id: ChainId,
    pub nonce: Nonce,
}

impl SignInMessage {
    /// Parses a rendered message back into its fields.
    ///
    /// The token issued by the verifier is bound to the address recovered
    /// here, not to whatever the UI currently shows, so parsing must be
    /// the exact inverse of [`Display`](fmt::Display).
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedMessage`] if a line is missing or
    /// out of order, or [`ProtocolError::InvalidAddress`] if the address
    /// line isn't a valid address.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let mut lines = text.split('\n');

        let header = next_line(&mut lines, "header")?;
        let domain = header
            .strip_suffix(HEADER_SUFFIX)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| malformed("header line"))?
            .to_string();

        let address = Address::parse(next_line(&mut lines, "address")?)?;
        expect_blank(next_line(&mut lines, "blank line")?)?;

        // The statement block is optional: if the next line is already
        // the URI field, the message was rendered without one.
        let mut line = next_line(&mut lines, "statement or URI")?;
        let statement = if line.starts_with(URI_TAG) {
            String::new()
        } else {
            let statement = line.to_string();
            expect_blank(next_line(&mut lines, "blank line")?)?;
            line = next_line(&mut lines, "URI")?;
            statement
        };

        let uri = tagged(line, URI_TAG)?.to_string();
        let version = tagged(next_line(&mut lines, "version")?, VERSION_TAG)?.to_string();
        let chain_id = tagged(next_line(&mut lines, "chain id")?, CHAIN_ID_TAG)?
            .parse::<u64>()
            .map(ChainId)
            .map_err(|_| malformed("chain id is not an integer"))?;
        let nonce = Nonce(tagged(next_line(&mut lines, "nonce")?, NONCE_TAG)?.to_string());

        if lines.next().is_some() {
            return Err(malformed("trailing content after nonce"));
        }

        Ok(Self {
            domain,
            address,
            statement,
            uri,
            version,
            chain_id,
            nonce,
        })
    }

    /// Folds a multi-line statement into the single line the layout
    /// allows. Line breaks become single spaces and blank lines vanish.
    ///
    /// ```rust
    /// use daogate_protocol::SignInMessage;
    ///
    /// let folded = SignInMessage::single_line_statement("Sign in.\r\n\nVote safely.");
    /// assert_eq!(folded, "Sign in. Vote safely.");
    /// ```
    pub fn single_line_statement(statement: &str) -> String {
        statement
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SignInMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{HEADER_SUFFIX}\n{}\n\n", self.domain, self.address)?;
        if !self.statement.is_empty() {
            write!(f, "{}\n\n", self.statement)?;
        }
        write!(
            f,
            "{URI_TAG}{}\n{VERSION_TAG}{}\n{CHAIN_ID_TAG}{}\n{NONCE_TAG}{}",
            self.uri, self.version, self.chain_id, self.nonce
        )
    }
}

fn next_line<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<&'a str, ProtocolError> {
    lines.next().ok_or_else(|| malformed(&format!("missing {what}")))
}

fn expect_blank(line: &str) -> Result<(), ProtocolError> {
    if line.is_empty() {
        Ok(())
    } else {
        Err(malformed("expected blank line"))
    }
}

fn tagged<'a>(line: &'a str, tag: &str) -> Result<&'a str, ProtocolError> {
    line.strip_prefix(tag)
        .ok_or_else(|| malformed(&format!("expected {:?} field", tag.trim_end())))
}

fn malformed(reason: &str) -> ProtocolError {
    ProtocolError::MalformedMessage(reason.to_string())
}
