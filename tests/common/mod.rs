//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use tool_gate::config::GateConfig;
use tool_gate::http::middleware::{DispatchObserver, RequestRecord};
use tool_gate::security::identity::SALT_LEN;
use tool_gate::security::{IdentityResolver, ManualClock};
use tool_gate::tools::WorkingHoursProvider;
use tool_gate::{GateParts, HttpServer};

/// 2026-03-10T12:00:00Z
pub const T0: u64 = 1_773_144_000_000;

pub const API_KEY: &str = "test-api-key";

/// Observer that keeps every record for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    records: Mutex<Vec<RequestRecord>>,
}

impl RecordingObserver {
    pub fn records(&self) -> Vec<RequestRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl DispatchObserver for RecordingObserver {
    fn on_complete(&self, record: &RequestRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// A fully wired gate running on a manual clock.
pub struct TestGate {
    pub server: HttpServer,
    pub clock: Arc<ManualClock>,
    pub observer: Arc<RecordingObserver>,
}

impl TestGate {
    pub fn new(config: GateConfig) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let observer = Arc::new(RecordingObserver::default());
        let parts = GateParts {
            clock: clock.clone(),
            identity: IdentityResolver::new([9u8; SALT_LEN], config.auth.require_api_key),
            slots: Arc::new(WorkingHoursProvider::new(&config.slots)),
            observer: observer.clone(),
        };
        Self {
            server: HttpServer::with_parts(config, parts),
            clock,
            observer,
        }
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }

    pub async fn get(&self, uri: &str, key: Option<&str>) -> TestResponse {
        send(self.router(), get_request(uri, key, None)).await
    }

    pub async fn get_from(&self, uri: &str, key: Option<&str>, addr: SocketAddr) -> TestResponse {
        send(self.router(), get_request(uri, key, Some(addr))).await
    }
}

/// Config with auth required and keyed, rate limiting at the given rate/burst.
pub fn config(rps: f64, burst: f64) -> GateConfig {
    let mut config = GateConfig::default();
    config.auth.require_api_key = true;
    config.auth.api_key = API_KEY.to_string();
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_second = rps;
    config.rate_limit.burst_size = burst;
    config
}

pub fn get_request(uri: &str, key: Option<&str>, addr: Option<SocketAddr>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let mut request = builder.body(Body::empty()).unwrap();
    if let Some(addr) = addr {
        request.extensions_mut().insert(ConnectInfo(addr));
    }
    request
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl TestResponse {
    pub fn retry_after(&self) -> Option<u64> {
        self.headers
            .get("retry-after")
            .map(|v| v.to_str().unwrap().parse().unwrap())
    }

    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
    }
}
