// ── Back-office console ──
//
// Binds one admin session to the cache: sign-in and session persistence,
// resource subscriptions with auth-aware fetchers, and command routing
// through the mutation coordinator.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bazaar_api::{AdminClient, AdminProfile, AuthContext, LoginRequest};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::Display;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandEnvelope};
use crate::config::ConsoleConfig;
use crate::error::{CoreError, ErrorKind, ResourceError};
use crate::fetch::{SharedFetcher, fetcher};
use crate::key::ResourceKey;
use crate::mutation::{MutationCoordinator, MutationResult};
use crate::policy::RevalidationConfig;
use crate::resource::Resource;
use crate::session::SessionStore;
use crate::store::ResourceCache;
use crate::stream::Subscription;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── AuthState ────────────────────────────────────────────────────

/// Session state observable by consumers. `Expired` is the signal to
/// send the admin back to the sign-in form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum AuthState {
    SignedOut,
    SignedIn,
    Expired,
}

// ── Console ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. Call
/// [`start()`](Self::start) to restore a persisted session and launch
/// the command processor.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    client: AdminClient,
    cache: ResourceCache,
    mutations: MutationCoordinator,
    sessions: Option<Arc<dyn SessionStore>>,
    auth_state: watch::Sender<AuthState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    running: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Console {
    /// Create a console with no session persistence.
    pub fn new(config: ConsoleConfig) -> Result<Self, CoreError> {
        Self::with_session_store(config, None)
    }

    pub fn with_session_store(
        config: ConsoleConfig,
        sessions: Option<Arc<dyn SessionStore>>,
    ) -> Result<Self, CoreError> {
        let client = AdminClient::new(
            config.api_url.clone(),
            config.areas.clone(),
            AuthContext::new(),
            &config.transport(),
        )?;
        let cache = ResourceCache::with_config(config.cache.clone());
        let mutations = MutationCoordinator::new(cache.clone());
        let (auth_state, _) = watch::channel(AuthState::SignedOut);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(ConsoleInner {
                config,
                client,
                cache,
                mutations,
                sessions,
                auth_state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                running: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.inner.cache
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.inner.mutations
    }

    /// The auth context every API call reads its token from.
    pub fn auth(&self) -> &AuthContext {
        self.inner.client.auth()
    }

    pub fn client(&self) -> &AdminClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Restore a persisted session (if a store is configured and holds
    /// one) and spawn the command processor.
    pub async fn start(&self) -> Result<AuthState, CoreError> {
        if let Some(store) = &self.inner.sessions {
            if !self.auth().is_authenticated() {
                if let Some(session) = store.load()? {
                    info!(email = %session.admin.email, "session restored");
                    self.auth().initialize(session);
                    self.inner.auth_state.send_replace(AuthState::SignedIn);
                }
            }
        }

        let mut handles = self.inner.task_handles.lock().await;
        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let console = self.clone();
            handles.push(tokio::spawn(command_processor_task(console, rx)));
        }
        self.inner.running.store(true, Ordering::Release);

        Ok(*self.inner.auth_state.borrow())
    }

    /// Stop background work and drop every cached entry.
    pub async fn shutdown(&self) {
        self.inner.running.store(false, Ordering::Release);
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        self.inner.cache.clear();
        debug!("console stopped");
    }

    /// One-shot: start, run closure, shut down.
    pub async fn oneshot<F, Fut, T>(
        config: ConsoleConfig,
        sessions: Option<Arc<dyn SessionStore>>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Console) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let console = Self::with_session_store(config, sessions)?;
        console.start().await?;
        let result = f(console.clone()).await;
        console.shutdown().await;
        result
    }

    // ── Authentication ───────────────────────────────────────────

    /// Exchange credentials for a session. Clears the cache so nothing
    /// from a previous admin survives, and persists the new session.
    pub async fn sign_in(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<AdminProfile, CoreError> {
        let request = LoginRequest::new(email, password);
        let session = self.inner.client.login(&request).await?;

        self.inner.cache.clear();
        if let Some(store) = &self.inner.sessions {
            if let Err(e) = store.save(&session) {
                warn!(error = %e, "session not persisted");
            }
        }
        self.inner.auth_state.send_replace(AuthState::SignedIn);
        Ok(session.admin)
    }

    /// Forget the session locally and in the store, and empty the cache.
    pub fn sign_out(&self) -> Result<(), CoreError> {
        self.inner.client.logout();
        self.inner.cache.clear();
        self.inner.auth_state.send_replace(AuthState::SignedOut);
        if let Some(store) = &self.inner.sessions {
            store.purge()?;
        }
        Ok(())
    }

    pub fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_state.subscribe()
    }

    pub fn current_admin(&self) -> Option<AdminProfile> {
        self.auth().admin()
    }

    // ── Resources ────────────────────────────────────────────────

    /// Cache key for `resource`, or `None` while signed out (which makes
    /// subscriptions inert instead of firing doomed requests).
    pub fn key(&self, resource: &Resource) -> Option<ResourceKey> {
        self.auth()
            .is_authenticated()
            .then(|| resource.key())
    }

    pub fn subscribe(&self, resource: &Resource, config: RevalidationConfig) -> Subscription {
        self.inner
            .cache
            .subscribe(self.key(resource), self.fetcher_for(resource), config)
    }

    /// Fetch `resource` once, bypassing freshness, and return its value.
    pub async fn fetch(&self, resource: &Resource) -> Result<Arc<Value>, CoreError> {
        let key = self.key(resource).ok_or(CoreError::NotSignedIn)?;
        let subscription = self.subscribe(resource, RevalidationConfig::manual());
        let state = match self.inner.cache.revalidate(&key).await {
            Some(state) => state,
            None => subscription.state(),
        };
        drop(subscription);

        if let Some(err) = state.error {
            return Err(err.into());
        }
        Ok(state.data.unwrap_or_else(|| Arc::new(Value::Null)))
    }

    /// [`fetch()`](Self::fetch) and deserialize.
    pub async fn fetch_as<T: DeserializeOwned>(&self, resource: &Resource) -> Result<T, CoreError> {
        let value = self.fetch(resource).await?;
        T::deserialize(value.as_ref()).map_err(|e| {
            ResourceError::new(ErrorKind::Unknown, format!("unexpected shape: {e}")).into()
        })
    }

    fn fetcher_for(&self, resource: &Resource) -> SharedFetcher {
        let console = Arc::downgrade(&self.inner);
        let resource = resource.clone();
        fetcher(move |_key: ResourceKey| {
            let console = console.clone();
            let resource = resource.clone();
            async move {
                let Some(inner) = console.upgrade() else {
                    return Err(ResourceError::new(ErrorKind::Unknown, "console dropped"));
                };
                let result = resource
                    .fetch(&inner.client)
                    .await
                    .map_err(ResourceError::from);
                if let Err(err) = &result {
                    inner.on_failure(err);
                }
                result
            }
        })
    }

    // ── Environment signals ──────────────────────────────────────

    pub fn notify_focus(&self) {
        self.inner.cache.notify_focus();
    }

    pub fn notify_reconnect(&self) {
        self.inner.cache.notify_reconnect();
    }

    pub fn set_online(&self, online: bool) {
        self.inner.cache.set_online(online);
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command.
    ///
    /// Sends it through the command channel, so writes apply in
    /// submission order, and awaits the server's answer. On success the
    /// command's affected resources have been invalidated.
    pub async fn execute(&self, command: Command) -> Result<Value, CoreError> {
        if !self.inner.running.load(Ordering::Acquire) {
            return Err(CoreError::ConsoleStopped);
        }
        if !self.auth().is_authenticated() {
            return Err(CoreError::NotSignedIn);
        }

        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ConsoleStopped)?;

        rx.await.map_err(|_| CoreError::ConsoleStopped)?
    }
}

impl ConsoleInner {
    /// An auth failure outside sign-in means the token is dead: drop it
    /// everywhere and tell observers.
    fn on_failure(&self, err: &ResourceError) {
        if !err.kind.needs_reauth() {
            return;
        }
        let auth = self.client.auth();
        if !auth.is_authenticated() {
            return;
        }
        warn!(error = %err, "session rejected by server");
        auth.clear();
        if let Some(store) = &self.sessions {
            if let Err(e) = store.purge() {
                warn!(error = %e, "stored session not purged");
            }
        }
        self.auth_state.send_replace(AuthState::Expired);
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("auth_state", &*self.inner.auth_state.borrow())
            .finish_non_exhaustive()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task(console: Console, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = console.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = run_command(&console.inner, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

async fn run_command(inner: &ConsoleInner, command: Command) -> Result<Value, CoreError> {
    let name = command.name();
    let affected = command.affected();
    debug!(command = name, "executing");

    let result = inner
        .mutations
        .mutate(route_command(&inner.client, command), &affected)
        .await;
    match &result {
        Ok(_) => info!(command = name, "command applied"),
        Err(err) => inner.on_failure(err),
    }
    result.map_err(CoreError::from)
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(client: &AdminClient, command: Command) -> MutationResult {
    let ack = match command {
        Command::BanUser { id } => client.ban_user(&id).await,
        Command::UnbanUser { id } => client.unban_user(&id).await,
        Command::UpdateUserRole { id, role } => client.update_user_role(&id, &role).await,

        Command::ApproveListing { id } => client.approve_listing(&id).await,
        Command::RejectListing { id, note } => client.reject_listing(&id, &note).await,
        Command::RemoveListing { id } => client.remove_listing(&id).await,

        Command::ApproveVendor { id } => client.approve_vendor(&id).await,
        Command::RejectVendor { id, note } => client.reject_vendor(&id, &note).await,

        Command::UpdateKycStatus { id, decision } => client.update_kyc_status(&id, decision).await,
        Command::ResolveReport { id } => client.resolve_report(&id).await,

        Command::AddCategory { form } => client.add_category(form).await,
        Command::EditCategory { id, form } => client.edit_category(&id, form).await,
        Command::DeleteCategory { id } => client.delete_category(&id).await,
    }
    .map_err(ResourceError::from)?;

    serde_json::to_value(ack).map_err(|e| ResourceError::new(ErrorKind::Unknown, e.to_string()))
}
