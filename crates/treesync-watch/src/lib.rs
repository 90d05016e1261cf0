//! Treesync Watch - the directory-watch-to-remote-sync engine
//!
//! Maintains the set of watched directories, classifies raw filesystem
//! events into sync actions, filters ignored paths, and pushes each action
//! to the remote peer, with periodic self-healing of the watch set.
//!
//! ## Modules
//!
//! - [`watcher`] - notify wrapper converting OS events into [`FsChange`] values
//! - [`watch_set`] - [`WatchSetManager`], the single owner of the watch set
//! - [`dispatcher`] - [`SyncDispatcher`], event classification and push
//! - [`engine`] - [`WatchEngine`], the driver loop and reconciliation timer
//!
//! ## Data flow
//!
//! ```text
//! inotify ──→ WatcherSignal channel ──→ WatchEngine ──→ SyncDispatcher ──→ remote /sync
//!                                           │
//!                                    WatchSetManager
//! ```
//!
//! [`FsChange`]: watcher::FsChange
//! [`WatchSetManager`]: watch_set::WatchSetManager
//! [`SyncDispatcher`]: dispatcher::SyncDispatcher
//! [`WatchEngine`]: engine::WatchEngine

pub mod dispatcher;
pub mod engine;
pub mod watch_set;
pub mod watcher;

use thiserror::Error;

pub use engine::{ControlMessage, WatchEngine, CONTROL_CHANNEL_CAPACITY};
pub use watch_set::{WatchSetHandle, WatchSetManager};

/// Errors produced by watch-set operations.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The OS watch primitive rejected an operation.
    #[error("watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// An I/O error occurred while enumerating directories.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
