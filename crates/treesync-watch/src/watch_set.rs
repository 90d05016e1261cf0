//! Watch set management - the single owner of watched directories
//!
//! [`WatchSetManager`] owns the notify watcher and the set of directories
//! currently registered with the OS. Watches are registered per-directory
//! (non-recursive) so the set stays explicit and can be verified and
//! repaired by the reconciliation timer.
//!
//! Invariant: after a successful [`reload`](WatchSetManager::reload), the
//! set equals `{root} ∪ {non-ignored descendant directories}` as of the
//! enumeration. Partial registration failures leave whatever subset
//! succeeded; reload is best-effort, not transactional.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use treesync_core::IgnoreFilter;

use crate::watcher::{create_watcher, WatcherSignal};
use crate::WatchError;

// ============================================================================
// WatchSetHandle - read-only view for diagnostic surfaces
// ============================================================================

/// Cloneable read-only view of the watch set.
///
/// Handed to the control plane so the panel page can show what is being
/// watched without touching the manager itself.
#[derive(Debug, Clone)]
pub struct WatchSetHandle {
    watched: Arc<RwLock<BTreeSet<PathBuf>>>,
}

impl WatchSetHandle {
    /// Current contents of the watch set, sorted.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.watched
            .read()
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of watched directories.
    pub fn len(&self) -> usize {
        self.watched.read().map(|set| set.len()).unwrap_or(0)
    }

    /// True when nothing is being watched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// WatchSetManager
// ============================================================================

/// Owns the notify watcher and the set of currently-watched directories.
///
/// The driver loop is the only mutator; diagnostic surfaces read through
/// [`WatchSetHandle`].
pub struct WatchSetManager {
    /// The underlying notify watcher instance.
    watcher: RecommendedWatcher,
    /// Directories currently registered with the OS.
    watched: Arc<RwLock<BTreeSet<PathBuf>>>,
}

impl WatchSetManager {
    /// Creates the manager and the signal channel feeding the driver loop.
    pub fn new() -> Result<(Self, mpsc::Receiver<WatcherSignal>), WatchError> {
        let (watcher, rx) = create_watcher()?;
        let manager = Self {
            watcher,
            watched: Arc::new(RwLock::new(BTreeSet::new())),
        };
        Ok((manager, rx))
    }

    /// Returns a cloneable read-only handle to the watch set.
    pub fn handle(&self) -> WatchSetHandle {
        WatchSetHandle {
            watched: Arc::clone(&self.watched),
        }
    }

    /// Registers a watch on one directory.
    pub fn add(&mut self, path: &Path) -> Result<(), WatchError> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        if let Ok(mut set) = self.watched.write() {
            set.insert(path.to_path_buf());
        }
        debug!(path = %path.display(), "Added watch");
        Ok(())
    }

    /// Deregisters a watch; "not watched" is tolerated.
    pub fn remove(&mut self, path: &Path) {
        if let Err(e) = self.watcher.unwatch(path) {
            debug!(path = %path.display(), error = %e, "Unwatch failed (tolerated)");
        }
        if let Ok(mut set) = self.watched.write() {
            set.remove(path);
        }
        debug!(path = %path.display(), "Removed watch");
    }

    /// Removes every watched path.
    pub fn remove_all(&mut self) {
        let paths = self.snapshot();
        for path in paths {
            self.remove(&path);
        }
    }

    /// Rebuilds the watch set from `root`.
    ///
    /// Removes every current watch, adds `root` (failure here is the only
    /// fatal case), then walks descendant directories depth-first in
    /// listing order, adding each one the filter does not reject. Per-
    /// directory registration failures are logged and skipped.
    pub fn reload(&mut self, root: &Path, filter: &IgnoreFilter) -> Result<(), WatchError> {
        self.remove_all();
        self.add(root)?;

        for dir in list_subdirs(root) {
            if filter.should_ignore(&dir) {
                info!(dir = %dir.display(), "Ignoring directory");
                continue;
            }
            if let Err(e) = self.add(&dir) {
                warn!(dir = %dir.display(), error = %e, "Failed to add watch");
            }
        }

        info!(root = %root.display(), watched = self.len(), "Watch set reloaded");
        Ok(())
    }

    /// Whether `path` is currently watched.
    pub fn contains(&self, path: &Path) -> bool {
        self.watched
            .read()
            .map(|set| set.contains(path))
            .unwrap_or(false)
    }

    /// Number of watched directories.
    pub fn len(&self) -> usize {
        self.watched.read().map(|set| set.len()).unwrap_or(0)
    }

    /// True when nothing is being watched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current contents of the watch set, sorted.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.watched
            .read()
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// Directory enumeration
// ============================================================================

/// Depth-first list of every descendant directory of `dir`, in the
/// underlying listing order (not sorted). Unreadable directories are
/// skipped silently; the caller gets whatever was reachable.
pub fn list_subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut result = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return result,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            result.push(path.clone());
            result.extend(list_subdirs(&path));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tree(root: &Path, dirs: &[&str], files: &[&str]) {
        for d in dirs {
            std::fs::create_dir_all(root.join(d)).unwrap();
        }
        for f in files {
            std::fs::write(root.join(f), b"x").unwrap();
        }
    }

    #[test]
    fn test_list_subdirs_finds_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        make_tree(tmp.path(), &["a", "a/b", "c"], &["top.txt", "a/inner.txt"]);

        let mut found = list_subdirs(tmp.path());
        found.sort();
        assert_eq!(
            found,
            vec![tmp.path().join("a"), tmp.path().join("a/b"), tmp.path().join("c")]
        );
    }

    #[test]
    fn test_list_subdirs_missing_dir_is_empty() {
        assert!(list_subdirs(Path::new("/nonexistent/path")).is_empty());
    }

    #[test]
    fn test_reload_builds_root_plus_descendants() {
        let tmp = tempfile::tempdir().unwrap();
        make_tree(tmp.path(), &["a", "a/b", "c"], &[]);

        let (mut manager, _rx) = WatchSetManager::new().unwrap();
        manager
            .reload(tmp.path(), &IgnoreFilter::default())
            .unwrap();

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert!(manager.contains(tmp.path()));
        assert!(manager.contains(&tmp.path().join("a")));
        assert!(manager.contains(&tmp.path().join("a/b")));
        assert!(manager.contains(&tmp.path().join("c")));
    }

    #[test]
    fn test_reload_skips_ignored_directories() {
        let tmp = tempfile::tempdir().unwrap();
        make_tree(tmp.path(), &["src", "cache"], &[]);

        let (mut manager, _rx) = WatchSetManager::new().unwrap();
        let filter = IgnoreFilter::new(&["cache/"]);
        manager.reload(tmp.path(), &filter).unwrap();

        assert!(manager.contains(&tmp.path().join("src")));
        assert!(!manager.contains(&tmp.path().join("cache")));
    }

    #[test]
    fn test_reload_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        make_tree(tmp.path(), &["a"], &[]);

        let (mut manager, _rx) = WatchSetManager::new().unwrap();
        let filter = IgnoreFilter::default();
        manager.reload(tmp.path(), &filter).unwrap();
        let first = manager.snapshot();
        manager.reload(tmp.path(), &filter).unwrap();
        assert_eq!(manager.snapshot(), first);
    }

    #[test]
    fn test_reload_missing_root_fails() {
        let (mut manager, _rx) = WatchSetManager::new().unwrap();
        let result = manager.reload(Path::new("/nonexistent/root"), &IgnoreFilter::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_tolerates_unwatched_path() {
        let (mut manager, _rx) = WatchSetManager::new().unwrap();
        // Must not panic or error.
        manager.remove(Path::new("/never/watched"));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_add_and_remove_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut manager, _rx) = WatchSetManager::new().unwrap();

        manager.add(tmp.path()).unwrap();
        assert!(manager.contains(tmp.path()));
        assert_eq!(manager.len(), 1);

        manager.remove(tmp.path());
        assert!(!manager.contains(tmp.path()));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_remove_all_empties_the_set() {
        let tmp = tempfile::tempdir().unwrap();
        make_tree(tmp.path(), &["a", "b"], &[]);

        let (mut manager, _rx) = WatchSetManager::new().unwrap();
        manager
            .reload(tmp.path(), &IgnoreFilter::default())
            .unwrap();
        assert!(!manager.is_empty());

        manager.remove_all();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_handle_reflects_manager_state() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut manager, _rx) = WatchSetManager::new().unwrap();
        let handle = manager.handle();

        assert!(handle.is_empty());
        manager.add(tmp.path()).unwrap();
        assert_eq!(handle.len(), 1);
        assert_eq!(handle.snapshot(), vec![tmp.path().to_path_buf()]);
    }
}
