//! The wallet seam.
//!
//! daogate doesn't talk to wallets itself; connection UI and signing
//! belong to whichever wallet library the host uses. Instead it defines
//! the [`Wallet`] trait: what the authentication core needs to know about
//! the connected account and the three actions it may request.
//!
//! A test double or an in-process signer implements the same trait, so no
//! framework code changes between production and tests.

use std::future::Future;

use daogate_protocol::{Address, ChainId, Signature};

use crate::WalletError;

/// The account a wallet currently exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub address: Address,
    pub chain_id: ChainId,
}

/// A connected (or connectable) wallet.
///
/// # Trait bounds
///
/// - `Send + Sync` → the wallet is shared by the authentication flow, the
///   delegation hydrator, and sign-out.
/// - `'static` → it lives as long as the client.
///
/// # Example
///
/// ```rust
/// use daogate_protocol::Signature;
/// use daogate_session::{Wallet, WalletAccount, WalletError};
///
/// /// Signs everything with a fixed signature. Tests only!
/// struct StaticWallet(WalletAccount);
///
/// impl Wallet for StaticWallet {
///     fn account(&self) -> Option<WalletAccount> {
///         Some(self.0.clone())
///     }
///
///     async fn sign_message(&self, _message: &str) -> Result<Signature, WalletError> {
///         Ok(Signature("0xsig".into()))
///     }
///
///     async fn revoke_permissions(&self) -> Result<(), WalletError> {
///         Ok(())
///     }
///
///     async fn disconnect(&self) -> Result<(), WalletError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Wallet: Send + Sync + 'static {
    /// Returns the connected account, or `None` when disconnected.
    fn account(&self) -> Option<WalletAccount>;

    /// Returns `true` if an account is connected.
    fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// Asks the wallet to sign `message` exactly as given (EIP-191
    /// `personal_sign`).
    ///
    /// # Returns
    /// - `Ok(Signature)`: the user approved
    /// - `Err(WalletError::Rejected)`: the user declined the prompt
    /// - `Err(_)`: any other provider failure
    fn sign_message(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<Signature, WalletError>> + Send;

    /// Revokes account permissions previously granted to this origin
    /// (`wallet_revokePermissions`). Best-effort; callers log failures.
    fn revoke_permissions(&self) -> impl Future<Output = Result<(), WalletError>> + Send;

    /// Drops the wallet connection.
    fn disconnect(&self) -> impl Future<Output = Result<(), WalletError>> + Send;
}
