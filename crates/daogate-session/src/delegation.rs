//! Delegated login through URL parameters.
//!
//! Another application can hand an already-authenticated actor to the
//! dashboard with a link like:
//!
//! ```text
//! https://gov.example.org/proposals?token=eyJ...&address=0x5290...9EE7
//! ```
//!
//! On load the parameters are read once, stripped from the visible URL
//! with a history *replace* (not a navigation, so neither reload nor
//! back-navigation brings them back), and the delegated identity takes
//! over from any wallet session.

use std::sync::Mutex;

use daogate_protocol::{Address, SessionToken};
use url::form_urlencoded;

use crate::{CredentialStore, Wallet};

/// Query parameter carrying the delegated session token.
pub const TOKEN_PARAM: &str = "token";
/// Query parameter carrying the delegated actor address.
pub const ADDRESS_PARAM: &str = "address";

/// The page's address bar, reduced to what delegation needs.
///
/// In a browser this is `window.location.search` plus
/// `history.replaceState`.
pub trait AddressBar: Send + Sync {
    /// The current query string, with or without a leading `?`.
    fn search(&self) -> String;

    /// Replaces the query string in place without navigating.
    fn replace_search(&self, search: &str);
}

/// An [`AddressBar`] that lives in memory.
#[derive(Debug, Default)]
pub struct MemoryAddressBar {
    search: Mutex<String>,
}

impl MemoryAddressBar {
    pub fn new(search: &str) -> Self {
        Self {
            search: Mutex::new(search.to_string()),
        }
    }
}

impl AddressBar for MemoryAddressBar {
    fn search(&self) -> String {
        self.search.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace_search(&self, search: &str) {
        *self.search.lock().unwrap_or_else(|e| e.into_inner()) = search.to_string();
    }
}

/// A delegated identity read from the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedLogin {
    pub token: SessionToken,
    pub address: Address,
}

/// Reads `token` and `address` from the query string and strips them.
///
/// Both parameters are stripped whenever either is present, even if the
/// pair turns out to be unusable. Other parameters are kept in order.
///
/// Returns `None` if the parameters are absent, the token is empty, or
/// the address isn't a `0x`-prefixed 40-hex-digit string.
pub fn take_delegated_login(bar: &impl AddressBar) -> Option<DelegatedLogin> {
    let search = bar.search();
    let query = search.strip_prefix('?').unwrap_or(&search);

    let mut token = None;
    let mut address = None;
    let mut kept = form_urlencoded::Serializer::new(String::new());
    let mut kept_any = false;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            TOKEN_PARAM => token = Some(value.into_owned()),
            ADDRESS_PARAM => address = Some(value.into_owned()),
            _ => {
                kept.append_pair(&key, &value);
                kept_any = true;
            }
        }
    }

    if token.is_none() && address.is_none() {
        return None;
    }

    let remaining = if kept_any {
        format!("?{}", kept.finish())
    } else {
        String::new()
    };
    bar.replace_search(&remaining);
    tracing::debug!("delegated login parameters stripped from url");

    let token = token.filter(|t| !t.is_empty());
    let address = address.and_then(|a| Address::parse(&a).ok());
    match (token, address) {
        (Some(token), Some(address)) => Some(DelegatedLogin {
            token: SessionToken::new(token),
            address,
        }),
        _ => {
            tracing::warn!("ignoring incomplete or invalid delegated login parameters");
            None
        }
    }
}

/// Activates a delegated login from the URL, if one is present.
///
/// A connected wallet is disconnected first (best-effort, failures are
/// logged) and wallet-derived credential fields are purged, so nothing
/// from the wallet session leaks into delegated requests.
///
/// Returns the delegated address when delegation was activated.
pub async fn apply_url_delegation<W: Wallet>(
    store: &CredentialStore,
    wallet: &W,
    bar: &impl AddressBar,
) -> Option<Address> {
    let login = store.take_url_delegation(bar)?;

    if wallet.is_connected() {
        if let Err(e) = wallet.disconnect().await {
            tracing::warn!(error = %e, "failed to disconnect wallet for delegated login");
        }
    }

    store.activate_delegation(login.token, login.address.clone());
    Some(login.address)
}
