//! Free appointment slot lookup.
//!
//! The gate treats the provider as a pure data source; this module only
//! validates the requested date and shapes the response.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SlotsConfig;
use crate::error::GateError;
use crate::security::Clock;

/// One bookable slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Start time, `HH:MM` (UTC).
    pub time: String,
    pub duration_minutes: u32,
}

/// Source of free slots for a calendar date.
pub trait SlotProvider: Send + Sync {
    fn free_slots(&self, date: NaiveDate) -> Vec<Slot>;
}

/// Evenly spaced slots across fixed working hours, every day.
#[derive(Debug, Clone)]
pub struct WorkingHoursProvider {
    start_minute: u32,
    end_minute: u32,
    slot_minutes: u32,
}

impl WorkingHoursProvider {
    pub fn new(config: &SlotsConfig) -> Self {
        Self {
            start_minute: config.day_start_hour * 60,
            end_minute: config.day_end_hour * 60,
            slot_minutes: config.slot_minutes,
        }
    }
}

impl SlotProvider for WorkingHoursProvider {
    fn free_slots(&self, _date: NaiveDate) -> Vec<Slot> {
        if self.slot_minutes == 0 {
            return Vec::new();
        }
        (self.start_minute..)
            .step_by(self.slot_minutes as usize)
            .take_while(|start| start + self.slot_minutes <= self.end_minute)
            .map(|start| Slot {
                time: format!("{:02}:{:02}", start / 60, start % 60),
                duration_minutes: self.slot_minutes,
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SlotQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FreeSlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

/// State for tool handlers.
#[derive(Clone)]
pub struct ToolsState {
    pub provider: Arc<dyn SlotProvider>,
    pub clock: Arc<dyn Clock>,
}

/// UTC calendar date for a millisecond timestamp.
pub fn date_from_millis(millis: u64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

/// Validate a requested `YYYY-MM-DD` date against `[today, today + 1 year]`.
/// A missing date means today.
pub fn parse_requested_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, GateError> {
    let Some(raw) = raw else {
        return Ok(today);
    };

    if !has_iso_date_shape(raw) {
        return Err(GateError::ValidationFailed(
            "date must be formatted as YYYY-MM-DD".to_string(),
        ));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| GateError::ValidationFailed(format!("{raw} is not a valid calendar date")))?;

    let horizon = today
        .checked_add_months(Months::new(12))
        .unwrap_or(NaiveDate::MAX);
    if date < today {
        return Err(GateError::ValidationFailed("date must not be in the past".to_string()));
    }
    if date > horizon {
        return Err(GateError::ValidationFailed(
            "date must be within one year from today".to_string(),
        ));
    }
    Ok(date)
}

fn has_iso_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// `GET /tools/get_free_slots?date=YYYY-MM-DD`
pub async fn get_free_slots(
    State(state): State<ToolsState>,
    query: Result<Query<SlotQuery>, QueryRejection>,
) -> Result<Json<FreeSlotsResponse>, GateError> {
    let Query(query) =
        query.map_err(|rejection| GateError::ValidationFailed(rejection.body_text()))?;
    let today = date_from_millis(state.clock.now_millis());
    let date = parse_requested_date(query.date.as_deref(), today)?;
    let slots = state.provider.free_slots(date);

    tracing::debug!(%date, count = slots.len(), "Free slots listed");
    Ok(Json(FreeSlotsResponse { date, slots }))
}
