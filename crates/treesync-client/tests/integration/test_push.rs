//! Integration tests for the push client wire behavior.
//!
//! Verifies query-string construction, sentinel path encoding, streamed
//! upload bodies, and error-message extraction against a wiremock peer.

use std::path::PathBuf;

use wiremock::matchers::{body_bytes, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use treesync_client::{PushClient, PushError};
use treesync_core::SyncAction;

use crate::common;

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_sends_file_bytes() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let file_path = root.path().join("note.txt");
    std::fs::write(&file_path, b"hello peer").unwrap();

    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(query_param("action", "upload"))
        .and(query_param("fileName", "note.txt"))
        .and(body_bytes(b"hello peer".to_vec()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).unwrap();
    client
        .send(&SyncAction::Upload { path: file_path }, root.path())
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_upload_encodes_nested_path_with_spaces() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let sub = root.path().join("a b");
    std::fs::create_dir(&sub).unwrap();
    let file_path = sub.join("c.txt");
    std::fs::write(&file_path, b"x").unwrap();

    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(query_param("action", "upload"))
        .and(query_param("fileName", "a1200b1100c.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).unwrap();
    client
        .send(&SyncAction::Upload { path: file_path }, root.path())
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_upload_missing_file_fails_without_request() {
    let (server, client) = common::setup_mock_peer().await;
    let root = tempfile::tempdir().unwrap();

    let result = client
        .send(
            &SyncAction::Upload {
                path: root.path().join("vanished.txt"),
            },
            root.path(),
        )
        .await;

    assert!(matches!(result, Err(PushError::FileOpen { .. })));
    // No request should have reached the peer.
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Mkdir / Delete / Rename
// ============================================================================

#[tokio::test]
async fn test_mkdir_sends_empty_body() {
    let server = MockServer::start().await;
    let root = PathBuf::from("/data/mirror");

    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(query_param("action", "mkdir"))
        .and(query_param("fileName", "drafts"))
        .and(body_bytes(Vec::new()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).unwrap();
    client
        .send(
            &SyncAction::Mkdir {
                path: root.join("drafts"),
            },
            &root,
        )
        .await
        .expect("mkdir failed");
}

#[tokio::test]
async fn test_delete_sends_relative_path() {
    let server = MockServer::start().await;
    let root = PathBuf::from("/data/mirror");

    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(query_param("action", "delete"))
        .and(query_param("fileName", "drafts1100old.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).unwrap();
    client
        .send(
            &SyncAction::Delete {
                path: root.join("drafts/old.txt"),
            },
            &root,
        )
        .await
        .expect("delete failed");
}

#[tokio::test]
async fn test_rename_crosses_wire_as_delete_of_old_path() {
    let server = MockServer::start().await;
    let root = PathBuf::from("/data/mirror");

    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(query_param("action", "delete"))
        .and(query_param("fileName", "old.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).unwrap();
    client
        .send(
            &SyncAction::Rename {
                old_path: root.join("old.txt"),
            },
            &root,
        )
        .await
        .expect("rename push failed");
}

// ============================================================================
// Error handling
// ============================================================================

#[tokio::test]
async fn test_non_200_json_message_is_extracted() {
    let (_server, client) = common::setup_rejecting_peer(500, "disk full").await;
    let root = PathBuf::from("/data/mirror");

    let result = client
        .send(
            &SyncAction::Delete {
                path: root.join("a.txt"),
            },
            &root,
        )
        .await;

    match result {
        Err(PushError::RemoteRejected { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "disk full");
        }
        other => panic!("expected RemoteRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_200_without_json_reports_bare_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).unwrap();
    let root = PathBuf::from("/data/mirror");
    let result = client
        .send(
            &SyncAction::Delete {
                path: root.join("a.txt"),
            },
            &root,
        )
        .await;

    assert!(matches!(
        result,
        Err(PushError::RemoteStatus { status: 502 })
    ));
}

#[tokio::test]
async fn test_path_outside_root_is_sent_as_is() {
    let server = MockServer::start().await;

    // strip_prefix fails, so the absolute path is encoded whole (leading
    // separator stripped by the codec).
    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(query_param("fileName", "elsewhere1100b.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).unwrap();
    client
        .send(
            &SyncAction::Delete {
                path: PathBuf::from("/elsewhere/b.txt"),
            },
            &PathBuf::from("/data/mirror"),
        )
        .await
        .expect("send failed");
}
