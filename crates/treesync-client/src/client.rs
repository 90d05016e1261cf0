//! HTTP push client for the `/sync` protocol
//!
//! [`PushClient`] transmits one classified [`SyncAction`] per call to the
//! remote peer's `/sync` endpoint. Uploads stream the file content straight
//! from an open handle; every other action sends an empty body.
//!
//! The client applies a bounded per-request timeout so a stalled remote
//! cannot block the driver loop's serialized dispatch indefinitely.

use std::path::Path;
use std::time::Duration;

use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use treesync_core::SyncAction;

use crate::codec::{PathCodec, SentinelCodec};

/// Default bound on one outbound request, connect through body.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Errors
// ============================================================================

/// Errors produced while pushing an action to the remote peer.
#[derive(Debug, Error)]
pub enum PushError {
    /// Connection, timeout, or other transport-level failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The local file for an upload could not be opened.
    #[error("failed to open {path} for upload: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-200 response carrying a JSON `{"message": ...}` body.
    #[error("response status code is {status}, msg: {message}")]
    RemoteRejected { status: u16, message: String },

    /// Non-200 response with no parseable message.
    #[error("response status code is {status}")]
    RemoteStatus { status: u16 },
}

/// JSON error body returned by the remote peer on failure.
#[derive(Debug, Deserialize)]
struct RemoteMessage {
    message: String,
}

// ============================================================================
// PushClient
// ============================================================================

/// HTTP client that pushes sync actions to a remote peer.
///
/// Wraps `reqwest::Client` with the remote base URL and the wire path
/// codec. One instance is shared by the dispatcher for the lifetime of the
/// driver loop; all sends through it are serialized by the caller.
pub struct PushClient {
    /// The underlying HTTP client (bounded request timeout).
    client: Client,
    /// Base URL of the remote peer, e.g. `http://127.0.0.1:8081`.
    base_url: String,
    /// Wire path codec (v1 sentinel scheme).
    codec: SentinelCodec,
}

impl PushClient {
    /// Creates a new `PushClient` targeting `base_url` with the default
    /// request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, PushError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a new `PushClient` with a custom request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            codec: SentinelCodec,
        })
    }

    /// Returns the base URL this client pushes to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pushes one action to the remote peer.
    ///
    /// The action's path is made relative to `root` (falling back to the
    /// path as-is when it is not under `root`), encoded with the wire
    /// codec, and sent as `POST /sync?action=...&fileName=...`. Uploads
    /// stream the file; a file that disappeared between the event and the
    /// send fails with [`PushError::FileOpen`].
    pub async fn send(&self, action: &SyncAction, root: &Path) -> Result<(), PushError> {
        let relative = action.path().strip_prefix(root).unwrap_or(action.path());
        let encoded = self.codec.encode(relative);
        let url = format!("{}/sync", self.base_url);

        debug!(
            action = action.wire_kind(),
            file = %encoded,
            "Pushing sync action"
        );

        let request = self
            .client
            .post(&url)
            .query(&[("action", action.wire_kind()), ("fileName", encoded.as_str())]);

        let request = if let SyncAction::Upload { path } = action {
            let file = tokio::fs::File::open(path).await.map_err(|source| {
                PushError::FileOpen {
                    path: path.display().to_string(),
                    source,
                }
            })?;
            request
                .header("Content-Type", "binary/octet-stream")
                .body(Body::wrap_stream(ReaderStream::new(file)))
        } else {
            request.header("Content-Type", "application/json")
        };

        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let is_json = response
                .headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("application/json"));

            if is_json {
                if let Ok(body) = response.json::<RemoteMessage>().await {
                    return Err(PushError::RemoteRejected {
                        status: status.as_u16(),
                        message: body.message,
                    });
                }
            }
            return Err(PushError::RemoteStatus {
                status: status.as_u16(),
            });
        }

        info!(file = %encoded, action = action.wire_kind(), "Sync push succeeded");
        Ok(())
    }
}
