//! Sync actions - the closed set of operations pushed to the remote peer
//!
//! One filesystem event is classified into at most one [`SyncAction`]. The
//! action is consumed immediately by the transport; it is never persisted.

use std::path::{Path, PathBuf};

/// One classified unit of work destined for the remote peer.
///
/// `Rename` carries only the old path: new-path tracking is not attempted,
/// so a rename crosses the wire as a delete of the old name, and the new
/// name (if still present) surfaces later through its own create event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Push the file's current bytes to the remote peer.
    Upload { path: PathBuf },
    /// Create the directory on the remote peer.
    Mkdir { path: PathBuf },
    /// Remove the file or directory on the remote peer.
    Delete { path: PathBuf },
    /// A local rename; only the old name is known.
    Rename { old_path: PathBuf },
}

impl SyncAction {
    /// The local path this action refers to.
    ///
    /// For renames this is the old path (the only one tracked).
    pub fn path(&self) -> &Path {
        match self {
            SyncAction::Upload { path }
            | SyncAction::Mkdir { path }
            | SyncAction::Delete { path } => path,
            SyncAction::Rename { old_path } => old_path,
        }
    }

    /// The `action` query-parameter value sent on the wire.
    ///
    /// A rename is transmitted as a delete of the old path (see the enum
    /// docs); the `rename` wire action exists for the receive side only.
    pub fn wire_kind(&self) -> &'static str {
        match self {
            SyncAction::Upload { .. } => "upload",
            SyncAction::Mkdir { .. } => "mkdir",
            SyncAction::Delete { .. } | SyncAction::Rename { .. } => "delete",
        }
    }

    /// Whether this action carries a request body (file content).
    pub fn has_body(&self) -> bool {
        matches!(self, SyncAction::Upload { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_accessor() {
        let action = SyncAction::Upload {
            path: PathBuf::from("/root/a.txt"),
        };
        assert_eq!(action.path(), Path::new("/root/a.txt"));

        let action = SyncAction::Rename {
            old_path: PathBuf::from("/root/old.txt"),
        };
        assert_eq!(action.path(), Path::new("/root/old.txt"));
    }

    #[test]
    fn test_wire_kind() {
        let path = PathBuf::from("/p");
        assert_eq!(SyncAction::Upload { path: path.clone() }.wire_kind(), "upload");
        assert_eq!(SyncAction::Mkdir { path: path.clone() }.wire_kind(), "mkdir");
        assert_eq!(SyncAction::Delete { path: path.clone() }.wire_kind(), "delete");
        // Renames cross the wire as deletes of the old name.
        assert_eq!(SyncAction::Rename { old_path: path }.wire_kind(), "delete");
    }

    #[test]
    fn test_only_upload_has_body() {
        let path = PathBuf::from("/p");
        assert!(SyncAction::Upload { path: path.clone() }.has_body());
        assert!(!SyncAction::Mkdir { path: path.clone() }.has_body());
        assert!(!SyncAction::Delete { path: path.clone() }.has_body());
        assert!(!SyncAction::Rename { old_path: path }.has_body());
    }
}
