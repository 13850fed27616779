//! Post-dispatch hook.
//!
//! Invoked once per request after the response has been produced, including
//! rejections from the admission layer. It never influences the response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Summary of a completed request.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub duration: Duration,
}

/// Receives a record for every completed request.
pub trait DispatchObserver: Send + Sync {
    fn on_complete(&self, record: &RequestRecord);
}

/// Default observer: one structured log line and request metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_complete(&self, record: &RequestRecord) {
        tracing::info!(
            method = %record.method,
            path = %record.path,
            status = record.status.as_u16(),
            duration_ms = record.duration.as_millis() as u64,
            "Request completed"
        );
        metrics::record_request(record.method.as_str(), record.status.as_u16(), record.duration);
    }
}

pub async fn dispatch_hook(
    State(observer): State<Arc<dyn DispatchObserver>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    observer.on_complete(&RequestRecord {
        method,
        path,
        status: response.status(),
        duration: start.elapsed(),
    });
    response
}
