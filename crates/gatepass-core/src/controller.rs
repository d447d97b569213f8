// ── Pass manager ──
//
// Lifecycle owner for one backend session: builds the REST client,
// runs the shared ticker, the expiry sweep, and the background refresh,
// and routes commands through a single processor task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_core::Stream;
use tokio::sync::{Mutex, Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gatepass_api::PassClient;

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::lifecycle::{CountdownView, countdown_stream, generate_code_with, normalize_code, render};
use crate::model::{PassId, Verification, VisitorPass};
use crate::store::{PassStore, ReconcileReport};
use crate::stream::PassStream;
use crate::ticker::{Clock, SystemClock, TickReceiver, Ticker};

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── PassManager ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<PassManagerInner>`. Background tasks are
/// acquired by [`connect()`](Self::connect) and released by
/// [`disconnect()`](Self::disconnect).
#[derive(Clone)]
pub struct PassManager {
    inner: Arc<PassManagerInner>,
}

struct PassManagerInner {
    config: ClientConfig,
    store: Arc<PassStore>,
    clock: Arc<dyn Clock>,
    ticker: Arc<Ticker>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    refresh_wanted: Notify,
    cancel: CancellationToken,
    /// Scoped to one connection; replaced on every `connect()`.
    cancel_child: Mutex<CancellationToken>,
    client: Mutex<Option<PassClient>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PassManager {
    /// Create a manager on the wall clock. Does NOT connect.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager on an injected clock.
    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let ticker = Arc::new(Ticker::new(Arc::clone(&clock)));
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(PassManagerInner {
                config,
                store: Arc::new(PassStore::new()),
                clock,
                ticker,
                connection_state,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                refresh_wanted: Notify::new(),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                client: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<PassStore> {
        &self.inner.store
    }

    /// The manager's notion of "now".
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Build the REST client and spawn background tasks (ticker, sweep,
    /// command processor, and the refresh loop when enabled).
    ///
    /// With a refresh interval configured, the first reconcile runs
    /// before this returns.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.connection_state.send_replace(ConnectionState::Connecting);

        // Fresh child token per connection so a reconnect starts live tasks.
        let cancel = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = cancel.clone();

        let config = &self.inner.config;
        let client = match PassClient::new(config.url.clone(), &config.token, &config.transport()) {
            Ok(client) => client,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        *self.inner.client.lock().await = Some(client);

        if config.refresh_interval_secs > 0 {
            if let Err(e) = self.refresh().await {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                *self.inner.client.lock().await = None;
                return Err(e);
            }
        }

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            handles.push(tokio::spawn(command_processor_task(
                self.clone(),
                rx,
                cancel.clone(),
            )));
        }

        handles.push(self.inner.ticker.spawn(config.tick_interval, cancel.clone()));

        handles.push(tokio::spawn(sweep_task(
            self.clone(),
            config.sweep_interval,
            cancel.clone(),
        )));

        if config.refresh_interval_secs > 0 {
            handles.push(tokio::spawn(refresh_task(
                self.clone(),
                Duration::from_secs(config.refresh_interval_secs),
                cancel,
            )));
        }

        self.inner.connection_state.send_replace(ConnectionState::Connected);
        info!(url = %config.url, role = %config.user.role, "pass manager connected");
        Ok(())
    }

    /// Cancel background tasks, join them, and drop the REST client.
    ///
    /// Only the connection's child token is cancelled; a later
    /// [`connect()`](Self::connect) spawns a fresh set of tasks.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        *self.inner.client.lock().await = None;

        // The old receiver was consumed by the processor task.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner.connection_state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command through the processor task and await the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::NotConnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        let command_tx = self.inner.command_tx.lock().await.clone();
        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotConnected)?;

        rx.await.map_err(|_| CoreError::NotConnected)?
    }

    /// Create a pass for `visitor_name` (blank means "Visitor").
    pub async fn create_pass(&self, visitor_name: Option<String>) -> Result<Arc<VisitorPass>, CoreError> {
        match self.execute(Command::CreatePass { visitor_name }).await? {
            CommandResult::Created(pass) => Ok(pass),
            other => Err(unexpected("CreatePass", &other)),
        }
    }

    /// Cancel a pass. Local removal happens whatever the backend says;
    /// the returned flag reports whether the backend confirmed.
    pub async fn cancel_pass(
        &self,
        identifier: &str,
    ) -> Result<(Option<Arc<VisitorPass>>, bool), CoreError> {
        let cmd = Command::CancelPass {
            identifier: identifier.to_owned(),
        };
        match self.execute(cmd).await? {
            CommandResult::Cancelled { pass, confirmed } => Ok((pass, confirmed)),
            other => Err(unexpected("CancelPass", &other)),
        }
    }

    /// Check a code at the gate.
    pub async fn verify_pass(&self, code: &str) -> Result<Verification, CoreError> {
        let cmd = Command::VerifyPass {
            code: code.to_owned(),
        };
        match self.execute(cmd).await? {
            CommandResult::Verified(v) => Ok(v),
            other => Err(unexpected("VerifyPass", &other)),
        }
    }

    /// Fetch the backend's active list and reconcile the store with it.
    pub async fn refresh(&self) -> Result<ReconcileReport, CoreError> {
        let client = self.client().await?;
        let records = client.list_visitor_passes(Some("active")).await?;
        let passes = records.into_iter().map(VisitorPass::from).collect();
        Ok(self.inner.store.reconcile(passes, self.now()))
    }

    /// Ask the refresh loop to reconcile soon. No-op when it is not running.
    pub fn request_refresh(&self) {
        self.inner.refresh_wanted.notify_one();
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Periodic refresh is disabled; callers that want the server's list
    /// call [`refresh()`](Self::refresh) themselves. The closure may use
    /// any error type a [`CoreError`] converts into.
    pub async fn oneshot<F, Fut, T, E>(config: ClientConfig, f: F) -> Result<T, E>
    where
        F: FnOnce(PassManager) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let manager = PassManager::new(cfg);
        manager.connect().await?;
        let result = f(manager.clone()).await;
        manager.disconnect().await;
        result
    }

    // ── Snapshots and streams ────────────────────────────────────

    /// Passes still active now, soonest expiry first.
    pub fn active_passes(&self) -> Vec<Arc<VisitorPass>> {
        self.inner.store.active(self.now())
    }

    pub fn passes(&self) -> PassStream {
        self.inner.store.subscribe()
    }

    /// Subscribe to the shared display ticker.
    pub fn ticks(&self) -> TickReceiver {
        self.inner.ticker.subscribe()
    }

    /// Live countdown for a held pass, ending after the expired view.
    pub fn watch_countdown(&self, id: &PassId) -> Option<impl Stream<Item = CountdownView> + use<>> {
        let pass = self.inner.store.get(id)?;
        Some(countdown_stream(pass.expires_at, self.ticks()))
    }

    // ── Internals ────────────────────────────────────────────────

    async fn client(&self) -> Result<PassClient, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Drop expired passes from the local list on a fixed cadence.
async fn sweep_task(manager: PassManager, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                manager.inner.store.sweep_expired(manager.now());
            }
        }
    }
}

/// Periodically reconcile with the backend, or sooner when asked.
async fn refresh_task(manager: PassManager, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = manager.inner.refresh_wanted.notified() => {}
            _ = interval.tick() => {}
        }
        if let Err(e) = manager.refresh().await {
            warn!(error = %e, "background refresh failed");
        }
    }
}

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task(
    manager: PassManager,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&manager, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(manager: &PassManager, cmd: Command) -> Result<CommandResult, CoreError> {
    let store = &manager.inner.store;
    let config = &manager.inner.config;

    match cmd {
        Command::CreatePass { visitor_name } => {
            let client = manager.client().await?;
            let code = generate_code_with(&mut rand::thread_rng(), config.code_length);
            let draft = VisitorPass::draft(&code, visitor_name.as_deref(), manager.now())?;

            // Nothing is sent if the payload cannot be drawn.
            render(&draft.qr_payload)?;

            let record = client.create_visitor_pass(&draft.to_create_request()).await?;
            let pass = draft.merge_record(record);
            info!(code = %pass.code, id = %pass.id, "visitor pass created");

            store.insert(pass.clone());
            manager.request_refresh();
            Ok(CommandResult::Created(Arc::new(pass)))
        }

        Command::CancelPass { identifier } => {
            let held = store.resolve(&identifier);
            let id = held
                .as_ref()
                .map_or_else(|| PassId::from(identifier.as_str()), |p| p.id.clone());

            let confirmed = match id.as_remote() {
                Some(remote) => match manager.client().await?.cancel_visitor_pass(remote).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(id = %id, error = %e, "backend cancel failed, removing locally anyway");
                        false
                    }
                },
                None => false,
            };

            let pass = store.mark_cancelled(&id, manager.now());
            manager.request_refresh();
            Ok(CommandResult::Cancelled { pass, confirmed })
        }

        Command::VerifyPass { code } => {
            if !config.user.role.can_verify() {
                return Err(CoreError::Unsupported {
                    operation: "pass verification".into(),
                    required: "watchman or admin role".into(),
                });
            }
            let code = normalize_code(&code)?;
            let response = manager.client().await?.verify_visitor_pass(&code).await?;
            let verification = Verification::from(response);
            debug!(code = %code, valid = verification.valid, "verified pass");
            Ok(CommandResult::Verified(verification))
        }

        Command::Refresh => manager.refresh().await.map(CommandResult::Refreshed),
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn unexpected(operation: &str, result: &CommandResult) -> CoreError {
    CoreError::Internal(format!("{operation} returned {result:?}"))
}
