mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CountingProvider, FakeDevice, Harness, config};
use serde_json::{Value, json};
use sprout_control::activity::ActivitySink;
use sprout_control::{ApiState, router};
use sprout_core::Decision;
use tokio::net::TcpListener;

struct TestServer {
    base: String,
    client: reqwest::Client,
    harness: Harness,
}

impl TestServer {
    async fn start() -> Self {
        let provider = CountingProvider::new(Decision::Hold, Duration::ZERO);
        let harness = Harness::start(config(Some("Bogura")), FakeDevice::new(40.0), provider);
        let activity: Arc<dyn ActivitySink> = harness.activity.clone();
        let app = router(ApiState {
            engine: harness.handle.clone(),
            activity,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            harness,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}

async fn wait_for<F: Fn(&Value) -> bool>(server: &TestServer, check: F) -> Value {
    for _ in 0..100 {
        let (_, body) = server.get_json("/api/status").await;
        if check(&body["data"]) {
            return body["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("status never reached the expected state");
}

#[tokio::test]
async fn health_check() {
    let server = TestServer::start().await;
    let response = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
    server.harness.stop().await;
}

#[tokio::test]
async fn status_reflects_session_start() {
    let server = TestServer::start().await;

    let (status, body) = server.get_json("/api/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["authenticated"], false);
    assert_eq!(body["data"]["pump"]["status"], "OFF");
    assert_eq!(body["data"]["device"]["mode"], "simulated");

    let (status, body) = server.post_json("/api/session/start", json!({})).await;
    assert_eq!(status, 202);
    assert_eq!(body["message"], "accepted");

    let data = wait_for(&server, |data| data["weather"].is_object()).await;
    assert_eq!(data["authenticated"], true);
    assert_eq!(data["location"], "Bogura");
    assert_eq!(data["recommendation"]["decision"], "Hold");
    assert_eq!(data["timers"]["fallback"], true);
    assert_eq!(server.harness.provider.calls(), 1);

    server.harness.stop().await;
}

#[tokio::test]
async fn pump_command_conflicts_while_disconnected() {
    let server = TestServer::start().await;

    let (status, body) = server.post_json("/api/pump", json!({ "state": "ON" })).await;
    assert_eq!(status, 409);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Cannot control pump. Device is not connected."
    );
    assert!(server.harness.device.commands().is_empty());

    server.harness.stop().await;
}

#[tokio::test]
async fn pump_command_reaches_connected_device() {
    let server = TestServer::start().await;

    let (status, _) = server
        .post_json("/api/device/connect", json!({ "addr": "192.168.4.1" }))
        .await;
    assert_eq!(status, 202);
    wait_for(&server, |data| data["device"]["connected"] == true).await;

    let (status, _) = server.post_json("/api/pump", json!({ "state": "ON" })).await;
    assert_eq!(status, 202);
    wait_for(&server, |data| data["pump"]["status"] == "ON").await;

    let (status, body) = server.get_json("/api/activity").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["action"], "Pump Manually Turned ON");

    server.harness.stop().await;
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post_json("/api/device/connect", json!({ "addr": "  " }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Please enter an IP address.");

    let response = server
        .client
        .post(server.url("/api/pump"))
        .json(&json!({ "state": "SIDEWAYS" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    server.harness.stop().await;
}

#[tokio::test]
async fn activity_can_be_listed_and_cleared() {
    let server = TestServer::start().await;
    server
        .harness
        .activity
        .record("Pump Manually Turned ON", "User override command sent to device.")
        .await
        .unwrap();
    server
        .harness
        .activity
        .record("Pump Manually Turned OFF", "User override command sent to device.")
        .await
        .unwrap();

    let (status, body) = server.get_json("/api/activity").await;
    assert_eq!(status, 200);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "Pump Manually Turned OFF");

    let response = server
        .client
        .delete(server.url("/api/activity"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["deleted"], 2);

    let (_, body) = server.get_json("/api/activity").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    server.harness.stop().await;
}
