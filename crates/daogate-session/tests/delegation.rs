//! Integration tests for delegated login activation against a live wallet.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use daogate_protocol::{Address, ChainId, SessionToken, Signature};
use daogate_session::{
    AddressBar, AuthMode, CredentialStore, MemoryAddressBar, MemoryStorage, Wallet,
    WalletAccount, WalletError, apply_url_delegation,
};

// =========================================================================
// Mock wallet
// =========================================================================

struct MockWallet {
    account: Mutex<Option<WalletAccount>>,
    disconnects: AtomicUsize,
    fail_disconnect: bool,
}

impl MockWallet {
    fn connected(address: Address) -> Self {
        Self {
            account: Mutex::new(Some(WalletAccount {
                address,
                chain_id: ChainId(1),
            })),
            disconnects: AtomicUsize::new(0),
            fail_disconnect: false,
        }
    }

    fn disconnected() -> Self {
        Self {
            account: Mutex::new(None),
            disconnects: AtomicUsize::new(0),
            fail_disconnect: false,
        }
    }
}

impl Wallet for MockWallet {
    fn account(&self) -> Option<WalletAccount> {
        self.account.lock().unwrap().clone()
    }

    async fn sign_message(&self, _message: &str) -> Result<Signature, WalletError> {
        Ok(Signature("0xsig".into()))
    }

    async fn revoke_permissions(&self) -> Result<(), WalletError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_disconnect {
            return Err(WalletError::Provider("provider unavailable".into()));
        }
        *self.account.lock().unwrap() = None;
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn wallet_addr() -> Address {
    Address::parse("0x1111111111111111111111111111111111111111").unwrap()
}

fn delegated_addr() -> Address {
    Address::parse("0x52908400098527886E0F7030069857D2E4169EE7").unwrap()
}

fn delegation_bar() -> MemoryAddressBar {
    MemoryAddressBar::new(&format!("?token=delegated&address={}", delegated_addr()))
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_apply_disconnects_wallet_and_purges_wallet_session() {
    let wallet = MockWallet::connected(wallet_addr());
    let store = CredentialStore::new(MemoryStorage::new());
    store.set_session(SessionToken::new("wallet-token"), wallet_addr());
    let bar = delegation_bar();

    let activated = apply_url_delegation(&store, &wallet, &bar).await;

    assert_eq!(activated, Some(delegated_addr()));
    assert_eq!(wallet.disconnects.load(Ordering::SeqCst), 1);
    let cred = store.snapshot();
    assert_eq!(cred.token, Some(SessionToken::new("delegated")));
    assert_eq!(cred.wallet_address, None);
    assert_eq!(bar.search(), "");
}

#[tokio::test]
async fn test_apply_resolves_delegated_even_if_wallet_stays_connected() {
    // The wallet refuses to disconnect; precedence must still hold.
    let mut wallet = MockWallet::connected(wallet_addr());
    wallet.fail_disconnect = true;
    let store = CredentialStore::new(MemoryStorage::new());

    apply_url_delegation(&store, &wallet, &delegation_bar()).await;

    assert!(wallet.is_connected());
    let mode = AuthMode::current(&wallet, &store.snapshot());
    assert_eq!(mode, AuthMode::Delegated(delegated_addr()));
}

#[tokio::test]
async fn test_apply_without_params_keeps_wallet_session() {
    let wallet = MockWallet::connected(wallet_addr());
    let store = CredentialStore::new(MemoryStorage::new());
    store.set_session(SessionToken::new("wallet-token"), wallet_addr());

    let activated = apply_url_delegation(&store, &wallet, &MemoryAddressBar::new("?tab=1")).await;

    assert_eq!(activated, None);
    assert_eq!(wallet.disconnects.load(Ordering::SeqCst), 0);
    assert_eq!(
        AuthMode::current(&wallet, &store.snapshot()),
        AuthMode::Wallet(wallet_addr())
    );
}

#[tokio::test]
async fn test_apply_with_no_wallet_skips_disconnect() {
    let wallet = MockWallet::disconnected();
    let store = CredentialStore::new(MemoryStorage::new());

    apply_url_delegation(&store, &wallet, &delegation_bar()).await;

    assert_eq!(wallet.disconnects.load(Ordering::SeqCst), 0);
    assert!(store.snapshot().has_delegation());
}

#[tokio::test]
async fn test_apply_twice_in_same_load_is_noop() {
    let wallet = MockWallet::disconnected();
    let store = CredentialStore::new(MemoryStorage::new());
    let bar = delegation_bar();
    apply_url_delegation(&store, &wallet, &bar).await;
    store.clear();

    // A stale link put back into the bar doesn't re-trigger delegation.
    bar.replace_search(&format!("?token=again&address={}", delegated_addr()));
    let second = apply_url_delegation(&store, &wallet, &bar).await;

    assert_eq!(second, None);
    assert!(store.snapshot().is_empty());
}
