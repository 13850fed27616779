//! Request middleware.
//!
//! # Layering
//! ```text
//! all routes:      request id → trace → timeout → dispatch hook → [cors]
//! /tools/* only:   admission (auth → rate limit) → tool handler
//! ```

pub mod admission;
pub mod dispatch;

pub use admission::{admission_middleware, AdmissionState, CallerContext};
pub use dispatch::{dispatch_hook, DispatchObserver, RequestRecord, TracingObserver};
