//! The credential store: the one persistent, shared, mutable resource.
//!
//! It is responsible for:
//! - Hydrating the credential from storage once at startup
//! - Replacing the credential atomically on every write
//! - Mirroring the token and bound address into storage
//! - Notifying subscribers after each change
//! - Consuming delegated-login URL parameters at most once per load
//!
//! # Concurrency note
//!
//! The value lives in a `tokio::sync::watch` channel. Every write is a
//! read-modify-write inside `send_if_modified`, and the storage mirror is
//! written under the same lock, so two writers never interleave between
//! memory and storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use daogate_protocol::{Address, SessionToken};
use tokio::sync::watch;

use crate::delegation::{self, AddressBar, DelegatedLogin};
use crate::{Credential, CredentialStorage, StorageKey};

/// Shared handle to the session credential.
///
/// Cloning is cheap (an `Arc` bump) and every clone sees the same value,
/// so the store can be handed to the auth flow, the request executor and
/// the UI alike.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ hydrate() ──→ set_session() / activate_delegation()
///                               │
///                               ▼
///                        clear_token()  (stale token after a 401)
///                               │
///                               ▼
///                           clear()      (sign-out)
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<Credential>,
    storage: Box<dyn CredentialStorage>,
    url_consumed: AtomicBool,
    // Bumped by `clear()` and `activate_delegation()`, always under the
    // channel's write lock. A sign-in that started before either discards
    // its result.
    generation: AtomicU64,
}

impl CredentialStore {
    /// Creates an empty store backed by `storage`. Call
    /// [`hydrate`](Self::hydrate) to load what a previous session left.
    pub fn new(storage: impl CredentialStorage) -> Self {
        let (state, _) = watch::channel(Credential::default());
        Self {
            inner: Arc::new(StoreInner {
                state,
                storage: Box::new(storage),
                url_consumed: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Loads the persisted token and address into memory.
    ///
    /// Unreadable storage or an invalid persisted address is logged and
    /// treated as absent; hydration itself never fails.
    pub fn hydrate(&self) -> Credential {
        let token = self.read_entry(StorageKey::Token).map(SessionToken::new);
        let wallet_address = self
            .read_entry(StorageKey::Address)
            .and_then(|raw| match Address::parse(&raw) {
                Ok(address) => Some(address),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding persisted address");
                    None
                }
            });

        let credential = Credential {
            token,
            wallet_address,
            delegated_address: None,
        };
        tracing::debug!(
            has_token = credential.token.is_some(),
            address = ?credential.wallet_address.as_ref().map(Address::as_str),
            "credential hydrated"
        );
        self.inner.state.send_replace(credential.clone());
        credential
    }

    /// Returns a copy of the current credential.
    pub fn snapshot(&self) -> Credential {
        self.inner.state.borrow().clone()
    }

    /// Returns the current session token, if any.
    pub fn token(&self) -> Option<SessionToken> {
        self.inner.state.borrow().token.clone()
    }

    /// Subscribes to credential changes.
    ///
    /// The receiver starts out holding the current value; `changed()`
    /// resolves after each subsequent write.
    pub fn subscribe(&self) -> watch::Receiver<Credential> {
        self.inner.state.subscribe()
    }

    /// Records a wallet sign-in: the token and the address it was issued
    /// to. Any delegated identity is dropped.
    pub fn set_session(&self, token: SessionToken, address: Address) {
        tracing::info!(%address, "wallet session stored");
        self.update(|current| {
            *current = Credential {
                token: Some(token),
                wallet_address: Some(address),
                delegated_address: None,
            };
            true
        });
    }

    /// Returns the store generation. It changes every time the store is
    /// [`clear`](Self::clear)ed or a delegated identity is
    /// [activated](Self::activate_delegation).
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Like [`set_session`](Self::set_session), but only if the
    /// generation hasn't changed since `generation` was read.
    ///
    /// Returns `false` (and writes nothing) if a sign-out or a delegated
    /// login happened in between.
    pub fn set_session_if_current(
        &self,
        generation: u64,
        token: SessionToken,
        address: Address,
    ) -> bool {
        let applied = self.update(|current| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            tracing::info!(%address, "wallet session stored");
            *current = Credential {
                token: Some(token),
                wallet_address: Some(address),
                delegated_address: None,
            };
            true
        });
        if !applied {
            tracing::info!("discarding session issued before a sign-out or delegated login");
        }
        applied
    }

    /// Records the connected wallet's address without touching the token.
    pub fn set_wallet_address(&self, address: Option<Address>) {
        self.update(|current| {
            current.wallet_address = address;
            true
        });
    }

    /// Switches to delegated mode.
    ///
    /// Wallet-derived fields are purged so a stale wallet session can't
    /// leak into delegated requests, and the generation is bumped so a
    /// wallet sign-in already in flight can't overwrite the delegation.
    /// The caller is responsible for disconnecting the wallet itself (see
    /// [`apply_url_delegation`](crate::apply_url_delegation)).
    pub fn activate_delegation(&self, token: SessionToken, address: Address) {
        tracing::info!(%address, "delegated session activated");
        self.update(|current| {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *current = Credential {
                token: Some(token),
                wallet_address: None,
                delegated_address: Some(address),
            };
            true
        });
    }

    /// Drops the session token, keeping the identity fields.
    ///
    /// Used when the server rejects the token: the next protected request
    /// must obtain a fresh one.
    pub fn clear_token(&self) {
        self.update(|current| {
            if current.token.take().is_some() {
                tracing::debug!("session token cleared");
            }
            true
        });
    }

    /// Drops the session token only if it is still `rejected`.
    ///
    /// When several requests fail with the same stale token, the first
    /// one to re-authenticate stores a fresh token; the others must not
    /// wipe it. Returns `true` if the token was dropped.
    pub fn discard_token(&self, rejected: &SessionToken) -> bool {
        self.update(|current| {
            if current.token.as_ref() != Some(rejected) {
                return false;
            }
            current.token = None;
            tracing::debug!("rejected session token discarded");
            true
        })
    }

    /// Forgets everything (sign-out).
    pub fn clear(&self) {
        tracing::info!("credential cleared");
        self.update(|current| {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *current = Credential::default();
            true
        });
    }

    /// Reads and strips delegated-login parameters from the address bar.
    ///
    /// Only the first call per store does anything: URL parameters are
    /// consumed at most once per load, even if something puts them back.
    pub fn take_url_delegation(&self, bar: &impl AddressBar) -> Option<DelegatedLogin> {
        if self.inner.url_consumed.swap(true, Ordering::SeqCst) {
            return None;
        }
        delegation::take_delegated_login(bar)
    }

    /// Applies `mutate` to the credential and mirrors the result into
    /// storage while the channel's write lock is held, so memory and
    /// storage always change together. Returns what `mutate` returned;
    /// `false` means nothing changed and nothing is written.
    fn update(&self, mutate: impl FnOnce(&mut Credential) -> bool) -> bool {
        self.inner.state.send_if_modified(|current| {
            if !mutate(current) {
                return false;
            }
            self.persist(current);
            true
        })
    }

    fn persist(&self, credential: &Credential) {
        let token = credential.token.as_ref().map(SessionToken::as_str);
        let address = credential.bound_address().map(Address::as_str);
        for (key, value) in [(StorageKey::Token, token), (StorageKey::Address, address)] {
            if let Err(e) = self.inner.storage.write(key, value) {
                tracing::warn!(key = key.as_str(), error = %e, "failed to persist credential entry");
            }
        }
    }

    fn read_entry(&self, key: StorageKey) -> Option<String> {
        match self.inner.storage.read(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "failed to read credential entry");
                None
            }
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("credential", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
