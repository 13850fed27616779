//! Admission gate for externally exposed tool endpoints.
//!
//! Requests for `/tools/*` pass an API key check and a per-caller token
//! bucket before reaching a tool handler; health and info routes bypass both.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod tools;

pub use config::GateConfig;
pub use error::GateError;
pub use http::{GateParts, HttpServer};
pub use lifecycle::Shutdown;
