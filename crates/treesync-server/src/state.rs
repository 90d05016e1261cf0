//! Shared state handed to every request handler.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use treesync_core::Config;
use treesync_watch::{ControlMessage, WatchSetHandle};

/// State shared between the HTTP handlers and the watch engine.
///
/// Handlers read and write the config snapshot through the lock and talk
/// to the engine exclusively through the control channel; the watch set is
/// visible read-only for the panel page.
#[derive(Clone)]
pub struct ServerState {
    /// Shared config snapshot (single source of truth for both sides).
    pub config: Arc<RwLock<Config>>,
    /// Where `POST /config` persists the configuration.
    pub config_path: PathBuf,
    /// Read-only view of the engine's watch set.
    pub watch_set: WatchSetHandle,
    /// Control channel into the driver loop.
    pub control_tx: mpsc::Sender<ControlMessage>,
}

impl ServerState {
    /// Sends a control message without blocking the handler.
    ///
    /// A full channel means a burst of signals is already queued; the
    /// engine collapses them, so dropping this one loses nothing.
    pub fn signal(&self, message: ControlMessage) {
        let _ = self.control_tx.try_send(message);
    }
}
