//! Treesync Client - wire codec and HTTP push client
//!
//! Provides:
//! - [`codec`] - the versioned path codec for the `/sync` wire protocol
//! - [`client`] - [`PushClient`], which transmits one [`SyncAction`] per call
//!
//! ## Wire contract
//!
//! ```text
//! POST /sync?action={upload|mkdir|delete|rename}&fileName=<encoded-relative-path>
//! Body: raw bytes (upload only) | empty
//! Response: 200 {"message":"ok"} | non-200 {"message":"<error>"} or bare status
//! ```
//!
//! Path encoding is NOT standard percent-encoding: see [`codec::SentinelCodec`].
//!
//! [`SyncAction`]: treesync_core::SyncAction

pub mod client;
pub mod codec;

pub use client::{PushClient, PushError};
pub use codec::{PathCodec, SentinelCodec};
