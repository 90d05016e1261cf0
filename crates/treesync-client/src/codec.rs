//! Wire path codec for the `/sync` protocol
//!
//! The protocol transmits relative paths in a query parameter using an ad
//! hoc escaping scheme, NOT standard percent-encoding: every directory
//! separator becomes the literal sentinel `1100` and every space becomes
//! `1200`. The scheme is part of the wire contract and must stay bit-exact
//! for compatibility with existing peers.
//!
//! The codec is isolated behind [`PathCodec`] so the wire format can be
//! swapped (e.g. for percent-encoding as a v2) without touching dispatch
//! logic. Swapping the codec is a protocol version change.

use std::path::{Path, PathBuf};

/// Sentinel substituted for `/` and `\` in encoded paths.
const SEPARATOR_SENTINEL: &str = "1100";

/// Sentinel substituted for spaces in encoded paths.
const SPACE_SENTINEL: &str = "1200";

/// Encode/decode pair for relative paths on the wire.
pub trait PathCodec {
    /// Encode a root-relative path for the `fileName` query parameter.
    fn encode(&self, relative: &Path) -> String;

    /// Reverse [`encode`](PathCodec::encode) exactly.
    fn decode(&self, wire: &str) -> PathBuf;
}

/// Version 1 codec, wire-compatible with existing peers.
///
/// Encoding strips one leading separator, then substitutes the sentinels.
/// `a b/c.txt` encodes to `a1200b1100c.txt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelCodec;

impl PathCodec for SentinelCodec {
    fn encode(&self, relative: &Path) -> String {
        let raw = relative.to_string_lossy();
        let raw = raw.strip_prefix(['/', '\\']).unwrap_or(&raw);
        raw.replace('\\', SEPARATOR_SENTINEL)
            .replace('/', SEPARATOR_SENTINEL)
            .replace(' ', SPACE_SENTINEL)
    }

    fn decode(&self, wire: &str) -> PathBuf {
        PathBuf::from(
            wire.replace(SEPARATOR_SENTINEL, "/")
                .replace(SPACE_SENTINEL, " "),
        )
    }
}
