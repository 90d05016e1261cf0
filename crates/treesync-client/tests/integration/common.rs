//! Shared test helpers for push client integration tests.
//!
//! Provides wiremock-based mock peer setup. Each helper mounts the
//! necessary mock endpoints and returns a configured PushClient pointing
//! at the mock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use treesync_client::PushClient;

/// Starts a mock peer that accepts every `/sync` POST with `{"message":"ok"}`
/// and returns a (MockServer, PushClient) tuple.
pub async fn setup_mock_peer() -> (MockServer, PushClient) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
        )
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).expect("client construction");

    (server, client)
}

/// Starts a mock peer that rejects every `/sync` POST with the given status
/// and a JSON `{"message": ...}` body.
pub async fn setup_rejecting_peer(status: u16, message: &str) -> (MockServer, PushClient) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(serde_json::json!({"message": message})),
        )
        .mount(&server)
        .await;

    let client = PushClient::new(server.uri()).expect("client construction");

    (server, client)
}
