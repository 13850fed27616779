//! API key authentication for tool routes.

use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::error::{GateError, Result};

/// Validates presented credentials against the configured key.
#[derive(Clone)]
pub struct AuthGate {
    required: bool,
    expected: String,
}

impl AuthGate {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            required: config.require_api_key,
            expected: config.api_key.trim().to_string(),
        }
    }

    /// Whether callers must present a key.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Decide whether a request may continue.
    ///
    /// Fails closed with [`GateError::AuthMisconfigured`] when a key is
    /// required but none is configured.
    pub fn check(&self, presented: Option<&str>) -> Result<()> {
        if !self.required {
            return Ok(());
        }
        if self.expected.is_empty() {
            return Err(GateError::AuthMisconfigured);
        }

        let presented = presented.map(str::trim).unwrap_or_default();
        if presented.is_empty() || !keys_match(presented, &self.expected) {
            return Err(GateError::Unauthorized);
        }
        Ok(())
    }
}

fn keys_match(presented: &str, expected: &str) -> bool {
    let presented = presented.as_bytes();
    let expected = expected.as_bytes();
    if presented.len() != expected.len() {
        return false;
    }
    presented.ct_eq(expected).into()
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("required", &self.required)
            .field("configured", &!self.expected.is_empty())
            .finish()
    }
}
