//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route classification)
//!     → request.rs (request ID)
//!     → middleware/dispatch.rs (post-dispatch hook, all routes)
//!     → middleware/admission.rs (tool routes only)
//!     → tool handler or public handler
//!     → response.rs (rejection bodies, Retry-After)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{GateParts, HttpServer};
