//! Tool endpoints exposed to external callers.
//!
//! Every route here sits behind the admission middleware; handlers only see
//! authenticated, rate-checked requests and validate their own inputs.

pub mod slots;

use axum::{routing::get, Router};

pub use slots::{FreeSlotsResponse, Slot, SlotProvider, ToolsState, WorkingHoursProvider};

/// Routes served under `/tools`.
pub fn tools_router(state: ToolsState) -> Router {
    Router::new()
        .route("/get_free_slots", get(slots::get_free_slots))
        .with_state(state)
}
