//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Protected request:
//!     → clock.rs (one timestamp for the whole decision)
//!     → auth.rs (API key check, fail closed when unconfigured)
//!     → identity.rs (salted caller token)
//!     → rate_limit.rs (per-identity token bucket)
//!     → Pass to tool handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: misconfiguration rejects traffic instead of disabling checks
//! - Components are owned instances injected at startup, never globals
//! - No raw credential or address is stored or logged

pub mod auth;
pub mod clock;
pub mod identity;
pub mod rate_limit;

pub use auth::AuthGate;
pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::{IdentityResolver, IdentitySource, IdentityToken};
pub use rate_limit::{Admission, BucketState, RateLimiter};
