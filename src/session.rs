//! UI-facing facade over the sync engine.
//!
//! `DirectorySession` wires the store, the mutation coordinator and the
//! edit-session synchronizer together and owns the operator's search query
//! and page window. Every read goes through [`DirectorySession::view`], which
//! derives the visible page from the cache on demand.
//!
//! Any `Auth` failure ends the session: the token is dropped, the cache and
//! edit session are cleared and the published [`AuthState`] flips to
//! `LoggedOut`.

use std::sync::Arc;

use parking_lot::Mutex;
use secrecy::SecretString;
use tokio::sync::watch;

use crate::config::MergePolicy;
use crate::error::{Result, UserdeckError};
use crate::remote::{AuthState, AuthStateStore, Credentials, DirectoryClient, TokenStore};
use crate::store::{LocalCache, UserStore};
use crate::sync::{EditLink, EditSession, EditSessionSync, LinkResolution, MutationCoordinator};
use crate::types::{UserId, UserPatch, UserRecord};
use crate::view::{DirectoryViewModel, PageWindow, compute_view_model, filter_users};

struct UiState<L> {
    query: String,
    window: PageWindow,
    edit: EditSessionSync<L>,
}

pub struct DirectorySession<C, L> {
    client: Arc<C>,
    tokens: Arc<TokenStore>,
    store: Arc<UserStore<C>>,
    mutations: MutationCoordinator<C>,
    auth: AuthStateStore,
    // Locked before the store's own mutex, never the other way round.
    ui: Mutex<UiState<L>>,
}

impl<C, L> DirectorySession<C, L>
where
    C: DirectoryClient + 'static,
    L: EditLink,
{
    pub fn new(client: Arc<C>, tokens: Arc<TokenStore>, link: L, policy: MergePolicy) -> Self {
        let store = Arc::new(UserStore::new(Arc::clone(&client)));
        let mutations = MutationCoordinator::new(Arc::clone(&client), Arc::clone(&store), policy);
        let initial = if tokens.is_set() {
            AuthState::LoggedIn
        } else {
            AuthState::LoggedOut
        };

        Self {
            client,
            tokens,
            store,
            mutations,
            auth: AuthStateStore::new(initial),
            ui: Mutex::new(UiState {
                query: String::new(),
                window: PageWindow::default(),
                edit: EditSessionSync::new(link),
            }),
        }
    }

    /// Exchange credentials for a token and start a session with it.
    pub async fn login(&self, credentials: &Credentials) -> Result<SecretString> {
        let token = self.client.login(credentials).await?;
        self.tokens.set(token.clone());
        self.auth.set(AuthState::LoggedIn);
        tracing::info!(email = %credentials.email, "logged in");
        Ok(SecretString::from(token))
    }

    /// End the session and drop everything cached for it.
    pub fn logout(&self) {
        self.tokens.clear();
        self.store.invalidate();
        {
            let mut ui = self.ui.lock();
            ui.edit.reset();
            ui.window.reset();
            ui.query.clear();
        }
        self.auth.set(AuthState::LoggedOut);
        tracing::info!("logged out");
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.current()
    }

    pub fn subscribe_auth(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }

    pub fn store(&self) -> &UserStore<C> {
        &self.store
    }

    fn end_on_auth<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result
            && err.is_auth()
        {
            tracing::warn!(error = %err, "authentication lost, ending session");
            self.logout();
        }
        result
    }

    /// Bulk-load the directory, then settle any edit link that arrived early.
    pub async fn load(&self) -> Result<LocalCache> {
        let cache = self.end_on_auth(self.store.load().await)?;

        let mut ui = self.ui.lock();
        let resolution = self
            .store
            .with_cache(|cache, _| ui.edit.on_load_settled(cache));
        tracing::debug!(?resolution, "edit link settled after load");
        self.reclamp_window(&mut ui);
        Ok(cache)
    }

    /// Pull the stored page back into range after the filtered view changed.
    fn reclamp_window(&self, ui: &mut UiState<L>) {
        let len = self
            .store
            .with_cache(|cache, _| filter_users(cache.records(), &ui.query).len());
        ui.window.reclamp(len);
    }

    /// Replace the search query. The page window always returns to page 1.
    pub fn set_search_query(&self, query: impl Into<String>) {
        let mut ui = self.ui.lock();
        ui.query = query.into();
        ui.window.reset();
    }

    /// Move to `page`, clamped to the filtered view. Returns the page shown.
    pub fn set_page(&self, page: usize) -> usize {
        let mut ui = self.ui.lock();
        let ui = &mut *ui;
        let len = self
            .store
            .with_cache(|cache, _| filter_users(cache.records(), &ui.query).len());
        ui.window.set_page(page, len);
        ui.window.page()
    }

    pub fn begin_edit(&self, id: UserId) -> Result<UserRecord> {
        let mut ui = self.ui.lock();
        self.store.with_cache(|cache, _| ui.edit.begin_edit(cache, id))
    }

    pub fn cancel_edit(&self) {
        self.ui.lock().edit.cancel();
    }

    pub fn edit_session(&self) -> EditSession {
        self.ui.lock().edit.session().clone()
    }

    /// Submit `patch` for the open record. The session stays open on failure.
    pub async fn submit_edit(&self, patch: UserPatch) -> Result<UserRecord> {
        let id = self
            .ui
            .lock()
            .edit
            .session()
            .id()
            .ok_or(UserdeckError::NoEditSession)?;

        let record = self.end_on_auth(self.mutations.apply_update(id, &patch).await)?;
        let mut ui = self.ui.lock();
        ui.edit.on_updated(id);
        self.reclamp_window(&mut ui);
        Ok(record)
    }

    pub async fn request_delete(&self, id: UserId) -> Result<UserRecord> {
        let removed = self.end_on_auth(self.mutations.apply_delete(id).await)?;
        let mut ui = self.ui.lock();
        ui.edit.on_deleted(id);
        self.reclamp_window(&mut ui);
        Ok(removed)
    }

    /// Feed a value from the edit-identifier channel (`None` means list view).
    pub fn observe_edit_id(&self, raw: Option<&str>) -> LinkResolution {
        let mut ui = self.ui.lock();
        self.store
            .with_cache(|cache, loaded| ui.edit.observe(raw, cache, loaded))
    }

    /// Derive the read model from the current state.
    pub fn view(&self) -> DirectoryViewModel {
        let is_loading = self.store.is_loading();
        let mut ui = self.ui.lock();
        self.reclamp_window(&mut ui);
        self.store.with_cache(|cache, _| {
            compute_view_model(cache, &ui.query, &ui.window, ui.edit.session(), is_loading)
        })
    }
}
