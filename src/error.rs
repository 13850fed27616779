use thiserror::Error;

/// Terminal outcomes of a request that did not reach, or was refused by,
/// a tool handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("API key authentication is required but no key is configured")]
    AuthMisconfigured,

    #[error("Missing or invalid API key")]
    Unauthorized,

    #[error("Rate limiter is misconfigured")]
    RateLimitMisconfigured,

    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("{0}")]
    ValidationFailed(String),
}

impl GateError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::AuthMisconfigured => "auth_misconfigured",
            GateError::Unauthorized => "unauthorized",
            GateError::RateLimitMisconfigured => "rate_limit_misconfigured",
            GateError::RateLimited { .. } => "rate_limited",
            GateError::ValidationFailed(_) => "validation_failed",
        }
    }

    /// True for deployment defects rather than caller faults.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, GateError::AuthMisconfigured | GateError::RateLimitMisconfigured)
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
