//! Request routing and handlers.
//!
//! The `/sync` POST handler is the receive side of the push protocol:
//! plain file I/O applying one action to the local target directory. The
//! remaining routes form the operator control plane. Handlers never touch
//! the engine directly; config changes go through the shared snapshot plus
//! a `Reload` signal.

use std::collections::HashMap;
use std::path::PathBuf;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode, Uri};
use tracing::{info, warn};

use treesync_client::{PathCodec, PushClient, SentinelCodec};
use treesync_core::IgnoreFilter;
use treesync_watch::dispatcher::SyncDispatcher;
use treesync_watch::ControlMessage;

use crate::page;
use crate::state::ServerState;

/// Routes one request to its handler.
pub async fn route(
    method: Method,
    uri: Uri,
    body: Bytes,
    state: &ServerState,
) -> Response<Full<Bytes>> {
    let path = uri.path().to_string();
    let query = parse_query(&uri);

    match (method, path.as_str()) {
        (Method::GET, "/") => panel_page(state).await,
        (Method::GET, "/refresh") => {
            state.signal(ControlMessage::Reload);
            redirect("/")
        }
        (Method::GET, "/start") => {
            state.signal(ControlMessage::Start);
            redirect("/")
        }
        (Method::POST, "/config") => update_config(&body, state).await,
        (Method::PUT, "/sync") => remote_push(&query, state).await,
        (Method::POST, "/sync") => apply_sync(&query, body, state).await,
        _ => json_message(StatusCode::NOT_FOUND, "not found"),
    }
}

// ============================================================================
// Receive side: POST /sync
// ============================================================================

/// Applies one pushed action to the local target directory.
async fn apply_sync(
    query: &HashMap<String, String>,
    body: Bytes,
    state: &ServerState,
) -> Response<Full<Bytes>> {
    let Some(action) = query.get("action") else {
        return json_message(StatusCode::INTERNAL_SERVER_ERROR, "action required");
    };
    let Some(encoded) = query.get("fileName") else {
        return json_message(StatusCode::INTERNAL_SERVER_ERROR, "fileName required");
    };

    let codec = SentinelCodec;
    let relative = codec.decode(encoded);
    let target_dir = state.config.read().await.sync.target_dir.clone();
    let target = target_dir.join(&relative);

    info!(action = %action, file = %relative.display(), "Applying pushed action");

    let result = match action.as_str() {
        "upload" => write_upload(&target, &body).await,
        "mkdir" => tokio::fs::create_dir(&target).await,
        "delete" => remove_path(&target).await,
        "rename" => match query.get("newFileName") {
            Some(new_encoded) => {
                let new_target = target_dir.join(codec.decode(new_encoded));
                tokio::fs::rename(&target, &new_target).await
            }
            None => {
                return json_message(StatusCode::INTERNAL_SERVER_ERROR, "newFileName required");
            }
        },
        other => {
            return json_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("unknown action: {other}"),
            );
        }
    };

    match result {
        Ok(()) => {
            // The apply itself fires local events; reloading afterwards
            // keeps the watch set aligned with whatever changed on disk.
            state.signal(ControlMessage::Reload);
            json_message(StatusCode::OK, "ok")
        }
        Err(e) => {
            warn!(action = %action, file = %relative.display(), error = %e, "Apply failed");
            json_message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Writes uploaded bytes, creating parent directories as needed.
async fn write_upload(target: &std::path::Path, body: &Bytes) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        if tokio::fs::metadata(parent).await.is_err() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(target, body).await
}

/// Removes a file, or an empty directory (recursive delete is never
/// pushed, so non-empty directories fail here and report 500).
async fn remove_path(target: &std::path::Path) -> std::io::Result<()> {
    let meta = tokio::fs::metadata(target).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir(target).await
    } else {
        tokio::fs::remove_file(target).await
    }
}

// ============================================================================
// Control plane
// ============================================================================

/// `GET /` - render the control panel.
async fn panel_page(state: &ServerState) -> Response<Full<Bytes>> {
    let config = state.config.read().await.clone();
    let watched = state.watch_set.snapshot();
    let html = page::render(&config, &watched);

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(html)))
        .unwrap_or_default()
}

/// `POST /config` - apply the submitted form, persist it, and signal the
/// engine to pick the new snapshot up.
async fn update_config(body: &Bytes, state: &ServerState) -> Response<Full<Bytes>> {
    let form: HashMap<String, String> = url::form_urlencoded::parse(body)
        .into_owned()
        .collect();

    let updated = {
        let mut config = state.config.write().await;

        if let Some(host) = form.get("targetHost").filter(|v| !v.is_empty()) {
            config.remote.host = host.clone();
        }
        if let Some(port) = form.get("targetPort").and_then(|v| v.parse().ok()) {
            config.remote.port = port;
        }
        if let Some(listen) = form.get("listen").and_then(|v| v.parse().ok()) {
            config.server.listen = listen;
        }
        if let Some(dir) = form.get("targetDir").filter(|v| !v.is_empty()) {
            config.sync.target_dir = PathBuf::from(dir);
        }
        if let Some(ignored) = form.get("ignored") {
            config.sync.ignored = ignored
                .trim_matches(',')
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config.normalize();

        for error in config.validate() {
            warn!(field = %error.field, message = %error.message, "Config warning");
        }

        config.clone()
    };

    if let Err(e) = updated.save(&state.config_path) {
        warn!(error = %e, "Failed to persist config");
        return json_message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }

    info!(path = %state.config_path.display(), "Configuration updated");
    state.signal(ControlMessage::Reload);
    redirect("/")
}

/// `PUT /sync?action=remote` - push the full local tree to the remote peer.
async fn remote_push(
    query: &HashMap<String, String>,
    state: &ServerState,
) -> Response<Full<Bytes>> {
    match query.get("action").map(String::as_str) {
        Some("remote") => {
            let config = state.config.read().await.clone();
            let client = match PushClient::new(config.remote_base_url()) {
                Ok(client) => client,
                Err(e) => {
                    return json_message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
                }
            };
            let dispatcher = SyncDispatcher::new(
                client,
                config.sync.target_dir.clone(),
                IgnoreFilter::new(&config.sync.ignored),
            );

            match dispatcher.push_tree().await {
                Ok(()) => json_message(StatusCode::OK, "ok"),
                Err(e) => {
                    warn!(error = %e, "Full-tree push failed");
                    json_message(StatusCode::INTERNAL_SERVER_ERROR, &format!("{e:#}"))
                }
            }
        }
        Some(other) => json_message(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("unknown action: {other}"),
        ),
        None => json_message(StatusCode::INTERNAL_SERVER_ERROR, "action required"),
    }
}

// ============================================================================
// Small response helpers
// ============================================================================

fn parse_query(uri: &Uri) -> HashMap<String, String> {
    url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect()
}

/// JSON `{"message": ...}` response with the given status.
fn json_message(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "message": message }).to_string();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_default()
}

/// 302 redirect.
fn redirect(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", location)
        .body(Full::new(Bytes::new()))
        .unwrap_or_default()
}
