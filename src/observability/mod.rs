//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gate and handlers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Identity tokens may be logged; API keys, salts and raw addresses never are
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
