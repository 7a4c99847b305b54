//! Session lifecycle manager.
//!
//! Owns the one `SessionSnapshot` of the process and publishes it through a
//! watch channel. All mutation goes through the operations here:
//! `bootstrap`, `login`, `logout`, `fetch_profile`, `fetch_transactions`.
//!
//! Two counters keep late async work from clobbering newer state:
//! - the session epoch changes whenever a login persists credentials or a
//!   logout clears them; fetch results carry the epoch they started under
//!   and are dropped if it has moved on.
//! - the login generation changes on every login and logout; the timer that
//!   clears a login error only fires for its own generation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{CredentialStore, Credentials, LoginError, LoginPayload, StoreError};
use crate::api::{DashboardApi, Resource};
use crate::config::Config;
use crate::models::{Loadable, SessionSnapshot};
use crate::nav::{HistoryMode, Navigator, Route};
use crate::purchases;

pub struct SessionManager {
    api: Arc<dyn DashboardApi>,
    store: CredentialStore,
    navigator: Option<Arc<dyn Navigator>>,

    state: Arc<watch::Sender<SessionSnapshot>>,
    epoch: AtomicU64,
    login_generation: Arc<AtomicU64>,
    error_clear: Mutex<Option<JoinHandle<()>>>,

    /// Serializes every store mutation made on behalf of a session.
    writer: Mutex<()>,
    bootstrapped: AtomicBool,

    user_id_prefix: String,
    login_error_ttl: Duration,
}

impl SessionManager {
    pub fn new(api: Arc<dyn DashboardApi>, store: CredentialStore, config: &Config) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            api,
            store,
            navigator: None,
            state: Arc::new(state),
            epoch: AtomicU64::new(0),
            login_generation: Arc::new(AtomicU64::new(0)),
            error_clear: Mutex::new(None),
            writer: Mutex::new(()),
            bootstrapped: AtomicBool::new(false),
            user_id_prefix: config.user_id_prefix.clone(),
            login_error_ttl: config.login_error_ttl(),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Resume a session from persisted credentials.
    ///
    /// Fetch failures do not block activation: a user whose data could not
    /// be refreshed is still logged in as long as the credentials are.
    /// Runs once; later calls just return the current snapshot.
    pub async fn bootstrap(&self) -> SessionSnapshot {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            warn!("Bootstrap already ran, ignoring");
            return self.snapshot();
        }

        let epoch = self.current_epoch();

        match self.store.load_credentials() {
            None => info!("No stored credentials, session stays logged out"),
            Some(credentials) => {
                info!(user_id = %credentials.user_id, "Resuming session from stored credentials");
                self.restore_cached_profile(epoch, &credentials);
                self.fetch_all(epoch, &credentials.user_id).await;

                if self.store.has_credentials() {
                    self.update_if_current(epoch, |s| s.session.is_active = true);
                } else {
                    warn!("Credentials disappeared during bootstrap");
                }
            }
        }

        self.state.send_modify(|s| s.session.is_bootstrapping = false);
        debug!(active = self.snapshot().is_active(), "Bootstrap complete");
        self.snapshot()
    }

    fn restore_cached_profile(&self, epoch: u64, credentials: &Credentials) {
        let Some(cached) = self.store.load_profile() else {
            return;
        };
        if cached.profile.user_id != credentials.user_id {
            debug!("Cached profile belongs to another user, ignoring");
            return;
        }
        debug!(age = %cached.age_display(), "Showing cached profile until refresh");
        self.update_if_current(epoch, |s| s.profile.data = Some(cached.profile));
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Log in with a payload from the login provider.
    ///
    /// Credentials are persisted before any request goes out, so a restart in
    /// the middle still resumes through `bootstrap`. Malformed payloads, and
    /// credentials the store failed to keep, show a login error that clears
    /// itself after the configured delay.
    pub async fn login(&self, payload: LoginPayload) -> Result<(), LoginError> {
        let started = self.state.send_if_modified(|s| {
            if s.session.login_in_progress {
                return false;
            }
            s.session.login_in_progress = true;
            s.session.login_error = None;
            true
        });
        if !started {
            warn!("Login requested while another login is in progress");
            return Err(LoginError::InProgress);
        }

        let generation = self.next_login_generation();
        let result = self.run_login(payload).await;

        self.state.send_modify(|s| s.session.login_in_progress = false);

        match &result {
            Ok(()) => info!("Login successful"),
            Err(e) if e.shows_banner() => {
                error!(error = %e, "Login failed");
                self.show_login_error(generation, e.user_message());
            }
            Err(e) => warn!(error = %e, "Login did not complete"),
        }
        result
    }

    async fn run_login(&self, payload: LoginPayload) -> Result<(), LoginError> {
        let (credentials, hint) = payload.normalize(&self.user_id_prefix)?;

        let epoch = {
            let _writer = self.lock_writer();
            self.store.save_credentials(&credentials);
            if self.store.load_credentials().as_ref() != Some(&credentials) {
                return Err(LoginError::NotPersisted);
            }

            let mut epoch = 0;
            self.state.send_modify(|s| {
                epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
                s.profile = Loadable::default();
                s.transactions = Loadable::default();
                s.purchased = Default::default();
                s.profile.data = hint;
            });
            epoch
        };
        debug!(user_id = %credentials.user_id, epoch = epoch, "Credentials persisted");

        self.fetch_all(epoch, &credentials.user_id).await;

        if self.current_epoch() != epoch {
            return Err(LoginError::Superseded);
        }
        if !self.store.has_credentials() {
            warn!("Credentials disappeared during login");
            return Err(LoginError::NotPersisted);
        }
        if !self.update_if_current(epoch, |s| s.session.is_active = true) {
            return Err(LoginError::Superseded);
        }

        if let Some(navigator) = &self.navigator {
            navigator.navigate(Route::Home, HistoryMode::Replace);
        }
        Ok(())
    }

    /// Clear persisted credentials and reset the session.
    ///
    /// In-memory state is reset even if the store fails to clear; the store
    /// error is returned so the caller can report it.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.next_login_generation();

        let _writer = self.lock_writer();
        self.state.send_modify(|s| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            s.reset();
        });

        match self.store.clear() {
            Ok(()) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to clear stored session");
                Err(e)
            }
        }
    }

    fn next_login_generation(&self) -> u64 {
        let generation = self.login_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = self.lock_error_clear().take() {
            handle.abort();
        }
        generation
    }

    fn show_login_error(&self, generation: u64, message: String) {
        let shown = self.state.send_if_modified(|s| {
            if self.login_generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.session.login_error = Some(message);
            true
        });
        if !shown {
            return;
        }

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.login_generation);
        let ttl = self.login_error_ttl;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            state.send_if_modified(|s| {
                if current.load(Ordering::SeqCst) != generation || s.session.login_error.is_none() {
                    return false;
                }
                s.session.login_error = None;
                true
            });
        });

        if let Some(previous) = self.lock_error_clear().replace(handle) {
            previous.abort();
        }
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Fetch the profile for `user_id` into the current session.
    pub async fn fetch_profile(&self, user_id: &str) {
        self.fetch_profile_for(self.current_epoch(), user_id).await;
    }

    /// Fetch transactions for `user_id` and re-derive purchased packages.
    pub async fn fetch_transactions(&self, user_id: &str) {
        self.fetch_transactions_for(self.current_epoch(), user_id).await;
    }

    /// Re-fetch both resources for the stored user.
    pub async fn refresh(&self) {
        match self.store.load_credentials() {
            Some(credentials) => self.fetch_all(self.current_epoch(), &credentials.user_id).await,
            None => debug!("Refresh skipped, no stored credentials"),
        }
    }

    /// Both fetches run concurrently and settle independently.
    async fn fetch_all(&self, epoch: u64, user_id: &str) {
        tokio::join!(
            self.fetch_profile_for(epoch, user_id),
            self.fetch_transactions_for(epoch, user_id),
        );
    }

    async fn fetch_profile_for(&self, epoch: u64, user_id: &str) {
        if user_id.is_empty() {
            return;
        }

        self.update_if_current(epoch, |s| {
            s.profile.loading = true;
            s.profile.error = None;
        });

        match self.api.fetch_profile(user_id).await {
            Ok(profile) => {
                let cached = profile.clone();
                let applied = self.update_if_current(epoch, |s| {
                    s.profile.data = Some(profile);
                    s.profile.loading = false;
                });
                if applied {
                    self.persist_if_current(epoch, |store| store.save_profile(&cached));
                } else {
                    debug!(user_id = user_id, "Discarding profile from a stale session");
                }
            }
            Err(e) => {
                let message = e.user_message(Resource::Profile);
                warn!(user_id = user_id, error = %e, "Profile fetch failed");
                self.update_if_current(epoch, |s| {
                    s.profile.error = Some(message);
                    s.profile.loading = false;
                });
            }
        }
    }

    async fn fetch_transactions_for(&self, epoch: u64, user_id: &str) {
        if user_id.is_empty() {
            return;
        }

        self.update_if_current(epoch, |s| {
            s.transactions.loading = true;
            s.transactions.error = None;
        });

        match self.api.fetch_transactions(user_id).await {
            Ok(records) => {
                let purchased = purchases::derive(&records);
                debug!(
                    user_id = user_id,
                    records = records.len(),
                    purchased = purchased.len(),
                    "Transactions fetched"
                );
                let applied = self.update_if_current(epoch, |s| {
                    s.transactions.data = records;
                    s.transactions.loading = false;
                    s.purchased = purchased;
                });
                if !applied {
                    debug!(user_id = user_id, "Discarding transactions from a stale session");
                }
            }
            Err(e) => {
                let message = e.user_message(Resource::Transactions);
                warn!(user_id = user_id, error = %e, "Transactions fetch failed");
                self.update_if_current(epoch, |s| {
                    s.transactions.error = Some(message);
                    s.transactions.loading = false;
                });
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Apply `f` only if no login or logout has happened since `epoch`.
    fn update_if_current(&self, epoch: u64, f: impl FnOnce(&mut SessionSnapshot)) -> bool {
        self.state.send_if_modified(|s| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            f(s);
            true
        })
    }

    fn persist_if_current(&self, epoch: u64, f: impl FnOnce(&CredentialStore)) {
        let _writer = self.lock_writer();
        if self.current_epoch() == epoch {
            f(&self.store);
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_error_clear(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.error_clear.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_error_clear().take() {
            handle.abort();
        }
    }
}
