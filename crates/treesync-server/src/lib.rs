//! Treesync Server - receive and control-plane HTTP surface
//!
//! Hosts the peer-facing `/sync` endpoints (applying pushed actions to the
//! local target directory, and the on-demand full-tree push) and the
//! operator-facing control plane (`/`, `/refresh`, `/start`, `/config`).
//!
//! These are simple request handlers with no internal state machine: they
//! read the shared config snapshot, do plain file I/O, and signal the watch
//! engine through its control channel. The engine is never mutated
//! directly.

pub mod page;
pub mod routes;
pub mod server;
pub mod state;

pub use server::SyncServer;
pub use state::ServerState;
