//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse, slot window non-empty)
//! - Report gate misconfigurations without aborting startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<warnings, errors>
//! - Auth and rate-limit misconfigurations are warnings: the gate enforces them
//!   fail-closed per request so health routes stay reachable

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GateConfig;

/// A configuration problem that prevents startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("slots window {start}:00-{end}:00 is empty or out of range")]
    SlotWindow { start: u32, end: u32 },

    #[error("slots.slot_minutes must be greater than zero")]
    ZeroSlotLength,

    #[error("auth.header_name '{0}' is not a valid header name")]
    HeaderName(String),
}

/// A gate misconfiguration that is enforced fail-closed at request time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigWarning {
    #[error("auth.require_api_key is set but no api_key is configured; tool routes will answer 503")]
    MissingApiKey,

    #[error("rate_limit requires positive finite requests_per_second and burst_size (got {rps}, {burst}); tool routes will answer 503")]
    MalformedRateLimit { rps: f64, burst: f64 },

    #[error("rate_limit.burst_size {0} is below 1; no request can ever be admitted")]
    BurstBelowOne(f64),
}

/// Validate a configuration, returning non-fatal warnings on success.
pub fn validate_config(config: &GateConfig) -> Result<Vec<ConfigWarning>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let slots = &config.slots;
    if slots.day_start_hour >= slots.day_end_hour || slots.day_end_hour > 24 {
        errors.push(ValidationError::SlotWindow {
            start: slots.day_start_hour,
            end: slots.day_end_hour,
        });
    }
    if slots.slot_minutes == 0 {
        errors.push(ValidationError::ZeroSlotLength);
    }

    if axum::http::HeaderName::from_bytes(config.auth.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::HeaderName(config.auth.header_name.clone()));
    }

    if config.auth.require_api_key && !config.auth.has_api_key() {
        warnings.push(ConfigWarning::MissingApiKey);
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        if !rl.is_well_formed() {
            warnings.push(ConfigWarning::MalformedRateLimit {
                rps: rl.requests_per_second,
                burst: rl.burst_size,
            });
        } else if rl.burst_size < 1.0 {
            warnings.push(ConfigWarning::BurstBelowOne(rl.burst_size));
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(errors)
    }
}
