#![allow(clippy::unwrap_used)]
// Integration tests for `ControllerClient` using wiremock.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use reqwest::Method;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ztadmin_api::{ControllerClient, Error, RetryPolicy, Route, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN: &str = "test-token-0123456789";

fn transport(retry: RetryPolicy) -> TransportConfig {
    TransportConfig {
        retry,
        ..TransportConfig::default()
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: Duration::ZERO,
    }
}

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let token = SecretString::from(TOKEN.to_owned());
    let client = ControllerClient::new(&server.uri(), &token, &transport(fast_retry())).unwrap();
    (server, client)
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

// ── Retry policy ────────────────────────────────────────────────────

#[tokio::test]
async fn test_retries_transient_status_then_succeeds() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/controller/network"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/controller/network"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["8056c2e21c000001"])))
        .mount(&server)
        .await;

    let ids = client.list_network_ids().await.unwrap();

    assert_eq!(ids, vec!["8056c2e21c000001".to_owned()]);
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_transient_status_exhausts_budget() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result = client.status().await;

    assert!(
        matches!(
            result,
            Err(Error::Transient {
                status: 502,
                attempts: 3
            })
        ),
        "expected Transient error, got: {result:?}"
    );
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/controller/network/8056c2e21c000001"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "bad route"})))
        .mount(&server)
        .await;

    let result = client
        .update_network("8056c2e21c000001", &json!({"routes": "nope"}))
        .await;

    match result {
        Err(Error::Upstream { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "bad route");
        }
        other => panic!("expected Upstream error, got: {other:?}"),
    }
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_non_retryable_method_gets_single_attempt() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/controller/network/x"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client
        .request(Method::PUT, "/controller/network/x", None)
        .await;

    assert!(matches!(result, Err(Error::Transient { attempts: 1, .. })));
    assert_eq!(request_count(&server).await, 1);
}

// ── Classification ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_classified_and_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/controller/network"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_network_ids().await;

    assert!(
        matches!(result, Err(Error::Unauthorized { status: 401 })),
        "expected Unauthorized error, got: {result:?}"
    );
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_forbidden_counts_as_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/peer"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client.list_peers().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    // Grab a free port, then close it so nothing is listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let token = SecretString::from(TOKEN.to_owned());
    let client = ControllerClient::new(
        &format!("http://127.0.0.1:{port}"),
        &token,
        &transport(fast_retry()),
    )
    .unwrap();

    let result = client.status().await;

    assert!(
        matches!(result, Err(Error::Unreachable { .. })),
        "expected Unreachable error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_total_timeout_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"address": "8056c2e21c"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let token = SecretString::from(TOKEN.to_owned());
    let config = TransportConfig {
        timeout: Duration::from_millis(100),
        retry: RetryPolicy::none(),
        ..TransportConfig::default()
    };
    let client = ControllerClient::new(&server.uri(), &token, &config).unwrap();

    match client.status().await {
        Err(Error::Unreachable { reason, .. }) => assert_eq!(reason, "timed out"),
        other => panic!("expected Unreachable error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"address": "8056c2e21c"}))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": "8056c2e21c"})))
        .mount(&server)
        .await;

    let token = SecretString::from(TOKEN.to_owned());
    let config = TransportConfig {
        timeout: Duration::from_millis(200),
        retry: fast_retry(),
        ..TransportConfig::default()
    };
    let client = ControllerClient::new(&server.uri(), &token, &config).unwrap();

    let status = client.status().await.unwrap();

    assert_eq!(status.address, "8056c2e21c");
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_timeouts_exhaust_budget_as_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let token = SecretString::from(TOKEN.to_owned());
    let config = TransportConfig {
        timeout: Duration::from_millis(100),
        retry: fast_retry(),
        ..TransportConfig::default()
    };
    let client = ControllerClient::new(&server.uri(), &token, &config).unwrap();

    let result = client.status().await;

    assert!(matches!(result, Err(Error::Unreachable { .. })));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_missing_network_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/controller/network/ffffffffffffffff"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let network = client.get_network("ffffffffffffffff").await.unwrap();

    assert!(network.is_none());
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_malformed_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = client.status().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Endpoints ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_auth_header_is_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .and(header("X-ZT1-Auth", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": "8056c2e21c",
            "version": "1.14.0",
            "online": true,
            "clock": 1_700_000_000_000_u64,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client.status().await.unwrap();

    assert_eq!(status.address, "8056c2e21c");
    assert_eq!(status.version, "1.14.0");
    assert!(status.extra.contains_key("clock"));
}

#[tokio::test]
async fn test_member_list_array_form_is_normalized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/controller/network/8056c2e21c000001/member"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"aaaaaaaaaa": 2},
            {"bbbbbbbbbb": 7},
        ])))
        .mount(&server)
        .await;

    let members = client.list_member_ids("8056c2e21c000001").await.unwrap();

    assert_eq!(members.ids().collect::<Vec<_>>(), ["aaaaaaaaaa", "bbbbbbbbbb"]);
    assert_eq!(members.revision("bbbbbbbbbb"), Some(&json!(7)));
}

#[tokio::test]
async fn test_create_network_uses_controller_address() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": "8056c2e21c"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/controller/network/8056c2e21c______"))
        .and(body_json(json!({"name": "lab"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nwid": "8056c2e21c3f2a11",
            "name": "lab",
            "routes": [{"target": "10.0.0.0/24", "via": null}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let network = client.create_network("lab").await.unwrap();

    assert_eq!(network.nwid, "8056c2e21c3f2a11");
    assert_eq!(
        network.routes,
        vec![Route {
            target: "10.0.0.0/24".into(),
            via: None,
        }]
    );
}

#[tokio::test]
async fn test_delete_member_accepts_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/controller/network/8056c2e21c000001/member/aaaaaaaaaa"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete_member("8056c2e21c000001", "aaaaaaaaaa")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_peer_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/peer/cccccccccc"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client.get_peer("cccccccccc").await.unwrap().is_none());
}

#[tokio::test]
async fn test_ids_cannot_escape_their_path_segment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": "8056c2e21c"})))
        .expect(0)
        .mount(&server)
        .await;

    let network = client.get_network("../../status").await.unwrap();
    assert!(network.is_none());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url.path(),
        "/controller/network/..%2F..%2Fstatus"
    );

    let err = client.get_member("..", "aaaaaaaaaa").await.unwrap_err();
    assert!(matches!(err, Error::InvalidPathSegment(_)));
    assert_eq!(request_count(&server).await, 1);
}

// ── Logging ─────────────────────────────────────────────────────────

/// Collects formatted log output for inspection.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_auth_token_never_appears_in_logs() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": "8056c2e21c"})))
        .mount(&server)
        .await;

    client.status().await.unwrap();
    tracing::debug!(client = ?client, "client state");

    let output = logs.contents();
    assert!(output.contains("controller request"), "nothing captured: {output}");
    assert!(output.contains("retrying"));
    assert!(!output.contains(TOKEN), "token leaked into logs: {output}");
}
