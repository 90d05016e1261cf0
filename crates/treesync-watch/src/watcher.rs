//! Raw event stream - notify wrapper and event-kind mapping
//!
//! Wraps the `notify` crate's callback interface behind a tokio mpsc
//! channel so the driver loop can `select!` over filesystem events. Raw
//! notify events are mapped into the closed [`FsChange`] union so adding
//! an event kind is a compile-time-checked change; watcher errors travel
//! down the same channel as [`WatcherSignal::Error`] and are never fatal.

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Buffer size of the watcher signal channel.
const SIGNAL_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// FsChange - closed union of filesystem event kinds
// ============================================================================

/// One classified filesystem change, decoupled from notify's raw events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsChange {
    /// A file or directory appeared at the path.
    Created(PathBuf),
    /// A file's content was written.
    Modified(PathBuf),
    /// A file or directory was removed.
    Removed(PathBuf),
    /// A file or directory was renamed away from this path.
    ///
    /// Only the old path is tracked; the new name surfaces through its own
    /// `Created` event when notify reports the rename destination.
    Renamed { old: PathBuf },
}

impl FsChange {
    /// The path this change refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            FsChange::Created(p) | FsChange::Modified(p) | FsChange::Removed(p) => p,
            FsChange::Renamed { old } => old,
        }
    }
}

/// One message from the watcher callback to the driver loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherSignal {
    /// A mapped filesystem change.
    Change(FsChange),
    /// A watcher-level error (logged by the driver loop, non-fatal).
    Error(String),
}

// ============================================================================
// Watcher construction
// ============================================================================

/// Creates the notify watcher and the signal channel feeding the driver loop.
///
/// The callback runs on notify's own thread and `blocking_send`s into the
/// channel; the receiver side is consumed by the [`WatchEngine`].
///
/// [`WatchEngine`]: crate::engine::WatchEngine
pub fn create_watcher() -> notify::Result<(RecommendedWatcher, mpsc::Receiver<WatcherSignal>)> {
    let (tx, rx) = mpsc::channel::<WatcherSignal>(SIGNAL_CHANNEL_CAPACITY);

    let watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            let signals = match res {
                Ok(event) => map_notify_event(&event)
                    .into_iter()
                    .map(WatcherSignal::Change)
                    .collect::<Vec<_>>(),
                Err(err) => vec![WatcherSignal::Error(err.to_string())],
            };
            for signal in signals {
                if let Err(e) = tx.blocking_send(signal) {
                    warn!(error = %e, "Failed to send watcher signal (receiver dropped)");
                }
            }
        },
        notify::Config::default(),
    )?;

    Ok((watcher, rx))
}

// ============================================================================
// Event mapping - notify::Event → FsChange
// ============================================================================

/// Converts a `notify::Event` into zero or more [`FsChange`] values.
///
/// - `Create(*)` → `Created`
/// - `Modify(Data(*))` / `Modify(Any)` → `Modified`
/// - `Modify(Name(From))` → `Renamed { old }`
/// - `Modify(Name(To))` → `Created` (the rename destination is treated as
///   a fresh create, mirroring how the remote side learns about it)
/// - `Modify(Name(Both))` with two paths → `Renamed { old }` + `Created`
/// - `Remove(*)` → `Removed`
/// - Metadata-only modifications and access events are dropped.
pub fn map_notify_event(event: &notify::Event) -> Vec<FsChange> {
    let paths = &event.paths;
    let first = || paths.first().cloned();

    match &event.kind {
        EventKind::Create(_) => first().map(FsChange::Created).into_iter().collect(),

        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            first().map(FsChange::Modified).into_iter().collect()
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => first()
            .map(|old| FsChange::Renamed { old })
            .into_iter()
            .collect(),

        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            first().map(FsChange::Created).into_iter().collect()
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if paths.len() >= 2 {
                vec![
                    FsChange::Renamed {
                        old: paths[0].clone(),
                    },
                    FsChange::Created(paths[1].clone()),
                ]
            } else {
                first()
                    .map(|old| FsChange::Renamed { old })
                    .into_iter()
                    .collect()
            }
        }

        EventKind::Modify(ModifyKind::Name(_)) => first()
            .map(|old| FsChange::Renamed { old })
            .into_iter()
            .collect(),

        EventKind::Remove(_) => first().map(FsChange::Removed).into_iter().collect(),

        other => {
            debug!(kind = ?other, "Ignoring event kind");
            Vec::new()
        }
    }
}
