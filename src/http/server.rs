//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with public and tool routes
//! - Classify routes: `/tools/*` is protected, everything else bypasses the gate
//! - Wire up middleware (request ID, tracing, timeout, dispatch hook, CORS)
//! - Bind server to listener and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{CorsConfig, GateConfig};
use crate::http::middleware::{
    admission_middleware, dispatch_hook, AdmissionState, DispatchObserver, TracingObserver,
};
use crate::http::request::{request_id_of, UuidRequestId};
use crate::security::{AuthGate, Clock, IdentityResolver, RateLimiter, SystemClock};
use crate::tools::{self, SlotProvider, ToolsState, WorkingHoursProvider};

const SERVICE_NAME: &str = "tool-gate";
const DEFAULT_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Collaborators injected into the server. Tests swap the clock, salt,
/// slot provider and observer; production uses [`GateParts::from_config`].
pub struct GateParts {
    pub clock: Arc<dyn Clock>,
    pub identity: IdentityResolver,
    pub slots: Arc<dyn SlotProvider>,
    pub observer: Arc<dyn DispatchObserver>,
}

impl GateParts {
    /// System clock, fresh random salt, working-hours slots, tracing observer.
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            identity: IdentityResolver::with_random_salt(config.auth.require_api_key),
            slots: Arc::new(WorkingHoursProvider::new(&config.slots)),
            observer: Arc::new(TracingObserver),
        }
    }
}

/// HTTP server for the tool gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Self {
        let parts = GateParts::from_config(&config);
        Self::with_parts(config, parts)
    }

    /// Create a server with explicit collaborators.
    pub fn with_parts(config: GateConfig, parts: GateParts) -> Self {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let key_header = key_header_name(&config.auth.header_name);

        let admission = AdmissionState {
            auth: Arc::new(AuthGate::new(&config.auth)),
            limiter: limiter.clone(),
            identity: Arc::new(parts.identity),
            clock: parts.clock.clone(),
            key_header,
        };
        let tools_state = ToolsState {
            provider: parts.slots,
            clock: parts.clock,
        };

        let router = Self::build_router(&config, admission, tools_state, parts.observer);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &GateConfig,
        admission: AdmissionState,
        tools_state: ToolsState,
        observer: Arc<dyn DispatchObserver>,
    ) -> Router {
        let key_header = admission.key_header.clone();
        let protected = tools::tools_router(tools_state)
            .layer(middleware::from_fn_with_state(admission, admission_middleware));

        let routes = Router::new()
            .route("/", get(service_info))
            .route("/health", get(health))
            .nest("/tools", protected);
        let router = with_ambient_layers(routes, config, observer);

        match cors_layer(&config.cors, key_header) {
            Some(cors) => router.layer(cors),
            None => router,
        }
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The limiter shared by all tool routes.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            auth_required = self.config.auth.require_api_key,
            rate_limit_enabled = self.limiter.is_enabled(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(
            tracked_identities = self.limiter.tracked_identities(),
            "HTTP server stopped"
        );
        Ok(())
    }
}

/// Timeout, tracing and request ids. The dispatch hook wraps the timeout so
/// timed-out requests are still recorded.
#[allow(deprecated)]
fn with_ambient_layers(
    router: Router,
    config: &GateConfig,
    observer: Arc<dyn DispatchObserver>,
) -> Router {
    router
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn_with_state(observer, dispatch_hook))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id_of(request),
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}

fn key_header_name(configured: &str) -> HeaderName {
    match HeaderName::from_bytes(configured.as_bytes()) {
        Ok(name) => name,
        Err(_) => {
            tracing::warn!(
                configured = %configured,
                fallback = %DEFAULT_KEY_HEADER,
                "Invalid API key header name, using fallback"
            );
            DEFAULT_KEY_HEADER
        }
    }
}

fn cors_layer(config: &CorsConfig, key_header: HeaderName) -> Option<CorsLayer> {
    if config.allow_origins.is_empty() {
        return None;
    }

    let wildcard = config.allow_origins.iter().any(|origin| origin == "*");
    let origin = if wildcard {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, key_header]);

    if config.allow_credentials {
        if wildcard {
            // Browsers reject credentialed responses with a wildcard origin.
            tracing::warn!("CORS credentials ignored with wildcard origin");
        } else {
            layer = layer.allow_credentials(true);
        }
    }
    Some(layer)
}

#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    version: &'static str,
    status: &'static str,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: SERVICE_NAME,
    })
}
