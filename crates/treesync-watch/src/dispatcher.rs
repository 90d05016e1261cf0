//! Sync dispatcher - classify one filesystem event and push the result
//!
//! [`SyncDispatcher`] turns one [`FsChange`] into at most one
//! [`SyncAction`] and transmits it to the remote peer:
//!
//! | Event   | Condition            | Action            | Side effect        |
//! |---------|----------------------|-------------------|--------------------|
//! | Modify  | regular file         | Upload            | none               |
//! | Modify  | dir or unreadable    | none (skipped)    | none               |
//! | Create  | directory            | Mkdir             | add watch          |
//! | Create  | regular file         | Upload            | none               |
//! | Remove  | watched directory    | Delete            | remove watch first |
//! | Remove  | file                 | Delete            | none               |
//! | Rename  | any                  | Delete (old path) | none               |
//!
//! Every produced action is checked against the ignore filter before
//! transmission; ignored actions are dropped with a log entry. Transport
//! failures are logged by the caller and the action is dropped — there is
//! no retry and no at-least-once guarantee.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use treesync_client::{PushClient, PushError};
use treesync_core::{IgnoreFilter, SyncAction};

use crate::watch_set::WatchSetManager;
use crate::watcher::FsChange;

/// Classifies filesystem changes and pushes the resulting actions.
///
/// Holds a config snapshot (root + filter); the engine rebuilds the
/// dispatcher on every reload so a config change cannot race an in-flight
/// classification.
pub struct SyncDispatcher {
    /// HTTP client for the remote `/sync` endpoint.
    client: PushClient,
    /// Root of the mirrored tree; action paths are made relative to it.
    root: PathBuf,
    /// Ignore rules applied to action base names.
    filter: IgnoreFilter,
}

impl SyncDispatcher {
    /// Creates a dispatcher for one config snapshot.
    pub fn new(client: PushClient, root: PathBuf, filter: IgnoreFilter) -> Self {
        Self {
            client,
            root,
            filter,
        }
    }

    /// The root this dispatcher relativizes against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classifies one change and pushes the resulting action, if any.
    ///
    /// Local stat failures skip the event (the path may already be gone);
    /// watch-set side effects run even when the transmission is dropped or
    /// fails, matching the reload semantics.
    pub async fn dispatch(
        &self,
        change: &FsChange,
        watch_set: &mut WatchSetManager,
    ) -> Result<(), PushError> {
        match change {
            FsChange::Modified(path) => {
                match tokio::fs::metadata(path).await {
                    Ok(meta) if meta.is_dir() => {
                        debug!(path = %path.display(), "Skipping directory modification");
                        Ok(())
                    }
                    Ok(_) => {
                        self.transmit(SyncAction::Upload { path: path.clone() })
                            .await
                    }
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "Skipping unreadable path");
                        Ok(())
                    }
                }
            }

            FsChange::Created(path) => {
                let meta = match tokio::fs::metadata(path).await {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Created path vanished before stat");
                        return Ok(());
                    }
                };

                if meta.is_dir() {
                    let result = self.transmit(SyncAction::Mkdir { path: path.clone() }).await;
                    if let Err(e) = watch_set.add(path) {
                        warn!(path = %path.display(), error = %e, "Failed to watch new directory");
                    }
                    result
                } else {
                    self.transmit(SyncAction::Upload { path: path.clone() })
                        .await
                }
            }

            FsChange::Removed(path) => {
                // A removed path present in the watch set was a directory
                // and must be deregistered before the delete is pushed.
                if watch_set.contains(path) {
                    info!(path = %path.display(), "Removing watch for deleted directory");
                    watch_set.remove(path);
                }
                self.transmit(SyncAction::Delete { path: path.clone() })
                    .await
            }

            FsChange::Renamed { old } => {
                self.transmit(SyncAction::Rename {
                    old_path: old.clone(),
                })
                .await
            }
        }
    }

    /// Ignore-checks and sends one action.
    async fn transmit(&self, action: SyncAction) -> Result<(), PushError> {
        if self.filter.should_ignore(action.path()) {
            info!(path = %action.path().display(), "Ignoring path");
            return Ok(());
        }
        self.client.send(&action, &self.root).await
    }

    // ========================================================================
    // Full-tree push
    // ========================================================================

    /// Pushes every non-ignored file under the root to the remote peer.
    ///
    /// Used by the control plane's "sync local to remote" operation.
    /// Ignored names are skipped without descending. Per-file push failures
    /// are logged and skipped; only an unreadable root is an error.
    pub async fn push_tree(&self) -> anyhow::Result<()> {
        let mut pending = vec![self.root.clone()];
        let mut first = true;

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if first => {
                    return Err(e).context(format!("failed to read {}", dir.display()));
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                    continue;
                }
            };
            first = false;

            while let Some(entry) = entries.next_entry().await.transpose() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                let path = entry.path();
                if self.filter.should_ignore(&path) {
                    debug!(path = %path.display(), "Ignoring path in tree push");
                    continue;
                }

                match entry.file_type().await {
                    Ok(ft) if ft.is_dir() => pending.push(path),
                    Ok(_) => {
                        if let Err(e) = self.client.send(&SyncAction::Upload { path: path.clone() }, &self.root).await
                        {
                            warn!(path = %path.display(), error = %e, "Tree push upload failed");
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping entry with unknown type");
                    }
                }
            }
        }

        Ok(())
    }
}
