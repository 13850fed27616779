//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the tool gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// API key authentication for tool routes.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Working hours used by the default slot provider.
    pub slots: SlotsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// API key authentication settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Reject tool requests that do not present the configured key.
    pub require_api_key: bool,

    /// Expected key. Empty means unset.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Header carrying the presented key.
    pub header_name: String,
}

impl AuthConfig {
    /// True when a non-blank key has been configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_api_key: true,
            api_key: String::new(),
            header_name: "x-api-key".to_string(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("require_api_key", &self.require_api_key)
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "<unset>" })
            .field("header_name", &self.header_name)
            .finish()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Sustained refill rate per identity (tokens per second).
    pub requests_per_second: f64,

    /// Bucket capacity per identity.
    pub burst_size: f64,
}

impl RateLimitConfig {
    /// Both parameters are positive finite numbers.
    pub fn is_well_formed(&self) -> bool {
        is_positive_finite(self.requests_per_second) && is_positive_finite(self.burst_size)
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 2.0,
            burst_size: 5.0,
        }
    }
}

/// Cross-origin resource sharing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty disables the CORS layer.
    pub allow_origins: Vec<String>,

    /// Allow credentialed requests.
    pub allow_credentials: bool,
}

/// Working hours for the default slot provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlotsConfig {
    /// First slot start hour (UTC, 0-23).
    pub day_start_hour: u32,

    /// Hour at which the last slot must have ended (UTC, 1-24).
    pub day_end_hour: u32,

    /// Slot length in minutes.
    pub slot_minutes: u32,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            day_start_hour: 9,
            day_end_hour: 17,
            slot_minutes: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
