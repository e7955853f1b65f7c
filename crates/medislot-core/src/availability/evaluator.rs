//! Availability evaluator.
//!
//! Handles:
//! - Day-of-week lookup (Sunday = 0, no timezone)
//! - Same-day windows, inclusive at both ends
//! - Windows that wrap past midnight (e.g. 22:00 → 06:00)

use chrono::NaiveDate;
use tracing::warn;

use crate::models::{window_contains, DayOfWeek, TimeOfDay, WeeklyAvailability};

/// Result of checking one slot, with enough detail to explain a refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCheck {
    Available {
        day: DayOfWeek,
    },
    /// Day missing from the table or marked unavailable
    DayUnavailable {
        day: DayOfWeek,
    },
    OutsideHours {
        day: DayOfWeek,
        start: TimeOfDay,
        end: TimeOfDay,
    },
    /// Day is available but its hours don't parse as `HH:MM`
    MalformedWindow {
        day: DayOfWeek,
    },
}

impl SlotCheck {
    pub fn is_available(&self) -> bool {
        matches!(self, SlotCheck::Available { .. })
    }

    pub fn day(&self) -> DayOfWeek {
        match *self {
            SlotCheck::Available { day }
            | SlotCheck::DayUnavailable { day }
            | SlotCheck::OutsideHours { day, .. }
            | SlotCheck::MalformedWindow { day } => day,
        }
    }
}

/// Check a requested date and time against the weekly table.
pub fn check_slot(availability: &WeeklyAvailability, date: NaiveDate, time: TimeOfDay) -> SlotCheck {
    let (day, window) = availability.for_date(date);

    let window = match window {
        Some(w) if w.is_available => w,
        _ => return SlotCheck::DayUnavailable { day },
    };

    let (start, end) = match window.bounds() {
        Ok(bounds) => bounds,
        Err(e) => {
            warn!(day = day.key(), error = %e, "availability window has malformed hours");
            return SlotCheck::MalformedWindow { day };
        }
    };

    if window_contains(start, end, time) {
        SlotCheck::Available { day }
    } else {
        SlotCheck::OutsideHours { day, start, end }
    }
}

/// Whether the slot falls inside an open window for its weekday.
pub fn is_slot_available(availability: &WeeklyAvailability, date: NaiveDate, time: TimeOfDay) -> bool {
    check_slot(availability, date, time).is_available()
}
