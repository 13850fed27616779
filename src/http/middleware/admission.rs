//! Admission control for tool routes.
//! Runs the auth gate, then the rate limiter, before any tool handler.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GateError;
use crate::observability::metrics;
use crate::security::{Admission, AuthGate, Clock, IdentityResolver, IdentityToken, RateLimiter};

/// Shared state for the admission middleware.
#[derive(Clone)]
pub struct AdmissionState {
    pub auth: Arc<AuthGate>,
    pub limiter: Arc<RateLimiter>,
    pub identity: Arc<IdentityResolver>,
    pub clock: Arc<dyn Clock>,
    pub key_header: HeaderName,
}

/// Identity attached to admitted requests.
#[derive(Clone, Debug)]
pub struct CallerContext {
    pub identity: IdentityToken,
    pub admitted_at_millis: u64,
}

impl AdmissionState {
    /// The full admission decision for one request.
    pub fn decide(
        &self,
        presented_key: Option<&str>,
        addr: Option<IpAddr>,
    ) -> Result<CallerContext, GateError> {
        let now = self.clock.now_millis();

        self.auth.check(presented_key)?;

        let identity = self.identity.resolve(presented_key, addr);
        match self.limiter.admit(&identity, now)? {
            Admission::Allowed => Ok(CallerContext {
                identity,
                admitted_at_millis: now,
            }),
            Admission::Denied { retry_after_secs } => {
                tracing::warn!(
                    identity = %identity,
                    retry_after_secs,
                    "Rate limit exceeded"
                );
                Err(GateError::RateLimited { retry_after_secs })
            }
        }
    }
}

pub async fn admission_middleware(
    State(state): State<AdmissionState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented_key = request
        .headers()
        .get(&state.key_header)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match state.decide(presented_key.as_deref(), addr) {
        Ok(ctx) => {
            tracing::debug!(identity = %ctx.identity, path = %request.uri().path(), "Request admitted");
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(err) => {
            if err.is_misconfiguration() {
                tracing::error!(error = %err, path = %request.uri().path(), "Gate misconfigured, rejecting");
            } else if err == GateError::Unauthorized {
                tracing::warn!(path = %request.uri().path(), "Rejected request with missing or invalid API key");
            }
            metrics::record_rejection(err.code());
            err.into_response()
        }
    }
}
