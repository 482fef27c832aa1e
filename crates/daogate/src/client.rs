//! `DaoClient` builder and the operations it exposes.
//!
//! This is the entry point for hosts. It ties together all the layers:
//! transport → session → auth → mutation.

use std::future::Future;
use std::sync::Arc;

use daogate_auth::{
    AuthExecutor, AuthResult, AuthService, Authenticator, ChallengeResponse, GraphQlAuthApi,
};
use daogate_mutation::{EntityCache, Notifier, OptimisticEngine, ToggleOutcome};
use daogate_protocol::{Address, GraphQlRequest, GraphQlResponse, SessionToken};
use daogate_session::{
    AddressBar, AuthMode, Credential, CredentialStorage, CredentialStore, MemoryStorage, Wallet,
    apply_url_delegation,
};
use daogate_transport::{Transport, TransportError};
use tokio::sync::watch;

use crate::likes::{self, ProposalId, ProposalLikes};
use crate::{ClientConfig, DaogateError};

type Service<W, T> = AuthService<W, GraphQlAuthApi<T>>;

/// Builder for configuring a [`DaoClient`].
///
/// # Example
///
/// ```rust,ignore
/// use daogate::prelude::*;
///
/// let client = DaoClient::builder()
///     .config(ClientConfig::from_file("daogate.json")?)
///     .storage(JsonFileStorage::new("session.json"))
///     .build(my_wallet, my_transport);
/// client.hydrate_from_url(&address_bar).await;
/// ```
#[derive(Default)]
pub struct DaoClientBuilder {
    config: ClientConfig,
    store: Option<CredentialStore>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl DaoClientBuilder {
    /// Creates a new builder with default settings and in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets where the session credential is persisted.
    pub fn storage(mut self, storage: impl CredentialStorage) -> Self {
        self.store = Some(CredentialStore::new(storage));
        self
    }

    /// Sets where failure notices for optimistic writes go. Defaults to
    /// the log.
    pub fn notifier(mut self, notifier: impl Notifier) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Builds the client and restores any persisted session.
    pub fn build<W: Wallet, T: Transport>(self, wallet: W, transport: T) -> DaoClient<W, T> {
        let config = self.config.validated();
        let store = self
            .store
            .unwrap_or_else(|| CredentialStore::new(MemoryStorage::new()));
        let restored = store.hydrate();

        let wallet = Arc::new(wallet);
        let transport = Arc::new(transport);
        let flow = ChallengeResponse::new(
            Arc::clone(&wallet),
            GraphQlAuthApi::new(Arc::clone(&transport)),
            store.clone(),
            config.sign_in_params(),
        );
        let auth = Arc::new(AuthService::new(flow));
        let executor =
            AuthExecutor::new(store.clone(), Arc::clone(&auth)).with_options(config.exec_options());

        let mut likes = OptimisticEngine::new(EntityCache::new());
        if let Some(notifier) = self.notifier {
            likes = likes.with_notifier(notifier);
        }

        tracing::info!(
            domain = %config.domain,
            restored_session = restored.token.is_some(),
            "client ready"
        );

        DaoClient {
            config,
            wallet,
            transport,
            store,
            auth,
            executor,
            likes,
        }
    }
}

/// A governance-API client with wallet sign-in.
///
/// Construct one per process with [`DaoClient::builder`] and share it by
/// reference. Every method takes `&self`.
pub struct DaoClient<W, T> {
    config: ClientConfig,
    wallet: Arc<W>,
    transport: Arc<T>,
    store: CredentialStore,
    auth: Arc<Service<W, T>>,
    executor: AuthExecutor<Service<W, T>>,
    likes: OptimisticEngine<ProposalId, ProposalLikes>,
}

impl DaoClient<(), ()> {
    /// Creates a new builder.
    pub fn builder() -> DaoClientBuilder {
        DaoClientBuilder::new()
    }
}

impl<W: Wallet, T: Transport> DaoClient<W, T> {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Returns the current credential.
    pub fn credential(&self) -> Credential {
        self.store.snapshot()
    }

    /// Subscribes to credential changes.
    pub fn subscribe(&self) -> watch::Receiver<Credential> {
        self.store.subscribe()
    }

    /// Resolves who the current actor is. Evaluated fresh on every call.
    pub fn identity(&self) -> AuthMode {
        AuthMode::current(&*self.wallet, &self.store.snapshot())
    }

    /// Consumes delegated-login parameters from the address bar, if any.
    ///
    /// Call once on startup. See [`apply_url_delegation`]. A wallet
    /// sign-in still in flight is detached; it can no longer store its
    /// token over the delegated one.
    pub async fn hydrate_from_url(&self, bar: &impl AddressBar) -> Option<Address> {
        let activated = apply_url_delegation(&self.store, &*self.wallet, bar).await?;
        self.auth.reset();
        Some(activated)
    }

    /// Records the wallet's current account after it changed.
    ///
    /// A token issued to another account (or to a wallet that is now
    /// disconnected) is dropped. Does nothing in delegated mode.
    pub fn sync_wallet(&self) {
        let credential = self.store.snapshot();
        if credential.has_delegation() {
            return;
        }
        let account = self.wallet.account().map(|a| a.address);
        let unchanged = match (&account, &credential.wallet_address) {
            (Some(current), Some(stored)) => current.eq_ignore_case(stored),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        tracing::info!(address = ?account.as_ref().map(Address::as_str), "wallet account changed");
        if credential.token.is_some() {
            self.store.clear_token();
        }
        self.store.set_wallet_address(account);
    }

    /// Signs in with the connected wallet, or joins a sign-in already in
    /// progress.
    pub async fn authenticate(&self) -> AuthResult {
        self.auth.authenticate().await
    }

    /// Returns `true` while a sign-in handshake is in flight.
    pub fn is_authenticating(&self) -> bool {
        self.auth.is_pending()
    }

    /// Runs a protected request with the session token, signing in or
    /// re-authenticating once as needed.
    pub async fn execute<R, F, Fut>(&self, request: F) -> Result<R, DaogateError>
    where
        F: FnMut(SessionToken) -> Fut,
        Fut: Future<Output = Result<R, TransportError>>,
    {
        self.executor.execute(request).await.map_err(DaogateError::from)
    }

    /// Sends a protected GraphQL operation.
    pub async fn query(&self, request: GraphQlRequest) -> Result<GraphQlResponse, DaogateError> {
        let transport = &self.transport;
        self.execute(|token| transport.request(request.clone(), Some(token)))
            .await
    }

    /// Cached proposal like state, keyed by view. Hosts insert what their
    /// queries return and refetch what [`take_stale`](EntityCache::take_stale)
    /// reports.
    pub fn proposals(&self) -> &EntityCache<ProposalId, ProposalLikes> {
        self.likes.cache()
    }

    /// Likes or unlikes a proposal.
    ///
    /// Every cached view of the proposal changes immediately. If the write
    /// fails the views are restored and a notice is sent (except when the
    /// user declined to sign). A second call for the same proposal while
    /// one is pending is skipped.
    pub async fn set_proposal_liked(
        &self,
        id: impl Into<ProposalId>,
        liked: bool,
    ) -> ToggleOutcome<DaogateError> {
        let id = id.into();
        let request = likes::set_like_request(&id, liked);
        self.likes
            .toggle(id, liked, || async move {
                let response = self.query(request).await?;
                response.field("setProposalLike")?;
                Ok::<(), DaogateError>(())
            })
            .await
    }

    /// Signs out: revokes wallet permissions and disconnects (both
    /// best-effort), clears the stored credential, and detaches any
    /// sign-in in progress.
    pub async fn sign_out(&self) {
        if self.wallet.is_connected() {
            if let Err(e) = self.wallet.revoke_permissions().await {
                tracing::warn!(error = %e, "failed to revoke wallet permissions");
            }
            if let Err(e) = self.wallet.disconnect().await {
                tracing::warn!(error = %e, "failed to disconnect wallet");
            }
        }
        self.store.clear();
        self.auth.reset();
        tracing::info!("signed out");
    }
}
