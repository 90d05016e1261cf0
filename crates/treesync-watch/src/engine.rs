//! Watch engine - the driver loop and reconciliation timer
//!
//! [`WatchEngine`] owns the watch set, the dispatcher, and the single
//! outbound push path: it is the one writer of the watch set and the one
//! sender of filesystem-event sync requests, so pushes are strictly
//! serialized (one in-flight request at a time, no ordering races between
//! concurrent uploads of the same path).
//!
//! The control plane never touches engine state directly. It updates the
//! shared config snapshot and sends a [`ControlMessage`] through the
//! control channel; the engine picks the new snapshot up on its next
//! reload. Queued reload messages collapse into one reload.
//!
//! ## Loop sources
//!
//! 1. the watcher signal channel (changes and watcher errors),
//! 2. the reconciliation interval - repairs an empty watch set,
//! 3. the control channel (`Start`, `Reload`),
//! 4. the cancellation token - graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use treesync_client::PushClient;
use treesync_core::{Config, IgnoreFilter};

use crate::dispatcher::SyncDispatcher;
use crate::watch_set::{WatchSetHandle, WatchSetManager};
use crate::watcher::WatcherSignal;

/// How often the reconciliation check runs.
const RECONCILE_INTERVAL: Duration = Duration::from_secs(1);

/// Buffer size of the control-message channel.
pub const CONTROL_CHANNEL_CAPACITY: usize = 10;

// ============================================================================
// Control messages
// ============================================================================

/// Messages from the control plane into the driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Begin watching (Idle → Watching). A no-op while already watching.
    Start,
    /// The config snapshot changed (or a refresh was requested): rebuild
    /// the dispatcher and reload the watch set.
    Reload,
}

/// Driver-loop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    /// No active watch; events are not processed.
    Idle,
    /// Watch set populated, events flowing.
    Watching,
}

// ============================================================================
// WatchEngine
// ============================================================================

/// The control loop that reads the OS event stream and the reconciliation
/// timer and routes work to the watch set manager and the dispatcher.
pub struct WatchEngine {
    /// Shared config snapshot (written by the control plane).
    config: Arc<RwLock<Config>>,
    /// Control messages from the HTTP surface.
    control_rx: mpsc::Receiver<ControlMessage>,
    /// Signals from the notify callback.
    signal_rx: mpsc::Receiver<WatcherSignal>,
    /// The single owner of the watched-directory set.
    watch_set: WatchSetManager,
    /// Classifier + transport for one config snapshot.
    dispatcher: SyncDispatcher,
    /// Ignore filter for the current snapshot (also used by reload).
    filter: IgnoreFilter,
    state: EngineState,
}

impl WatchEngine {
    /// Creates the engine in the Idle state.
    ///
    /// Failure here (the OS watcher cannot be created, or the push client
    /// cannot be built) is fatal to startup; everything after this point
    /// is survivable.
    pub async fn new(
        config: Arc<RwLock<Config>>,
        control_rx: mpsc::Receiver<ControlMessage>,
    ) -> anyhow::Result<(Self, WatchSetHandle)> {
        let (watch_set, signal_rx) = WatchSetManager::new()?;
        let handle = watch_set.handle();

        let snapshot = config.read().await.clone();
        let filter = IgnoreFilter::new(&snapshot.sync.ignored);
        let client = PushClient::new(snapshot.remote_base_url())?;
        let dispatcher = SyncDispatcher::new(
            client,
            snapshot.sync.target_dir.clone(),
            filter.clone(),
        );

        Ok((
            Self {
                config,
                control_rx,
                signal_rx,
                watch_set,
                dispatcher,
                filter,
                state: EngineState::Idle,
            },
            handle,
        ))
    }

    /// Runs the driver loop until the token is cancelled.
    ///
    /// Starts watching immediately. An initial reload failure (e.g. the
    /// root does not exist yet) is not fatal: the reconciliation timer
    /// keeps retrying while the watch set is empty.
    pub async fn run(mut self, shutdown: CancellationToken) {
        self.start().await;

        let mut reconcile = tokio::time::interval(RECONCILE_INTERVAL);
        let mut control_open = true;

        loop {
            tokio::select! {
                signal = self.signal_rx.recv() => {
                    match signal {
                        Some(WatcherSignal::Change(change)) => {
                            if self.state == EngineState::Watching {
                                debug!(change = ?change, "Processing filesystem change");
                                if let Err(e) = self
                                    .dispatcher
                                    .dispatch(&change, &mut self.watch_set)
                                    .await
                                {
                                    warn!(error = %e, "Sync push failed, action dropped");
                                }
                            }
                        }
                        Some(WatcherSignal::Error(e)) => {
                            warn!(error = %e, "Watcher reported an error");
                        }
                        None => {
                            warn!("Watcher signal channel closed, stopping engine");
                            break;
                        }
                    }
                }

                message = self.control_rx.recv(), if control_open => {
                    match message {
                        Some(msg) => self.handle_control(msg).await,
                        None => {
                            debug!("Control channel closed");
                            control_open = false;
                        }
                    }
                }

                _ = reconcile.tick() => {
                    if self.state == EngineState::Watching && self.watch_set.is_empty() {
                        info!("Watch set is empty, reconciling");
                        self.reload_current().await;
                    }
                }

                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping watch engine");
                    break;
                }
            }
        }

        info!("Watch engine stopped");
    }

    /// Idle → Watching transition.
    async fn start(&mut self) {
        if self.state == EngineState::Watching {
            debug!("Start requested but already watching");
            return;
        }
        info!("Starting watch engine");
        self.state = EngineState::Watching;
        self.reload_current().await;
    }

    /// Applies one control message, collapsing any queued duplicates so a
    /// burst of reload signals triggers a single reload.
    async fn handle_control(&mut self, message: ControlMessage) {
        let mut start = false;
        let mut reload = false;
        let mut note = |msg: ControlMessage| match msg {
            ControlMessage::Start => start = true,
            ControlMessage::Reload => reload = true,
        };
        note(message);
        while let Ok(extra) = self.control_rx.try_recv() {
            note(extra);
        }

        if start && self.state == EngineState::Idle {
            self.start().await;
        } else if reload {
            info!("Reload requested by control plane");
            self.reload_current().await;
        }
    }

    /// Re-reads the config snapshot, rebuilds the dispatcher, and reloads
    /// the watch set. Every failure is logged and survivable.
    async fn reload_current(&mut self) {
        let snapshot = self.config.read().await.clone();
        self.filter = IgnoreFilter::new(&snapshot.sync.ignored);

        match PushClient::new(snapshot.remote_base_url()) {
            Ok(client) => {
                self.dispatcher = SyncDispatcher::new(
                    client,
                    snapshot.sync.target_dir.clone(),
                    self.filter.clone(),
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to rebuild push client, keeping previous");
            }
        }

        if let Err(e) = self
            .watch_set
            .reload(&snapshot.sync.target_dir, &self.filter)
        {
            warn!(
                root = %snapshot.sync.target_dir.display(),
                error = %e,
                "Watch set reload failed"
            );
        }
    }
}
