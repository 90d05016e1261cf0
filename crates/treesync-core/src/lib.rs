//! Treesync Core - Domain logic shared by every crate
//!
//! This crate contains the pure, dependency-light pieces of treesync:
//! - **Configuration** - typed config with loading, validation, and defaults
//! - **Ignore rules** - the pattern filter excluding paths from watching/syncing
//! - **Sync actions** - the closed set of operations pushed to the remote peer
//!
//! Everything here is synchronous and side-effect free apart from config
//! file I/O; the async machinery lives in `treesync-watch` and
//! `treesync-client`.

pub mod action;
pub mod config;
pub mod filter;

pub use action::SyncAction;
pub use config::Config;
pub use filter::{IgnoreFilter, IgnoreRule};
