//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (GATE_* environment overrides)
//!     → validation.rs (semantic checks, fail-closed warnings)
//!     → GateConfig (validated, immutable)
//!     → injected into AuthGate / RateLimiter / server at startup
//! ```
//!
//! # Design Decisions
//! - Config is resolved once; nothing on the request path reads the environment
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, LoadedConfig};
pub use schema::{
    AuthConfig, CorsConfig, GateConfig, ListenerConfig, ObservabilityConfig, RateLimitConfig,
    SlotsConfig, TimeoutConfig,
};
pub use validation::{validate_config, ConfigWarning, ValidationError};
