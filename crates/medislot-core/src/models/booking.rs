//! Booking request and gate decision models.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::availability::{DayOfWeek, TimeOfDay};

/// Raw booking form input. Fields are transient and never persisted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// ISO date (`YYYY-MM-DD`), or a full ISO datetime
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM`
    #[serde(default)]
    pub time: Option<String>,
}

impl BookingRequest {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            time: Some(time.into()),
        }
    }

    /// The date field, treating blank input as absent.
    pub fn date_field(&self) -> Option<&str> {
        non_blank(self.date.as_deref())
    }

    /// The time field, treating blank input as absent.
    pub fn time_field(&self) -> Option<&str> {
        non_blank(self.time.as_deref())
    }

    pub fn has_required_fields(&self) -> bool {
        self.date_field().is_some() && self.time_field().is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A request that passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedBooking {
    pub date: NaiveDate,
    pub day: DayOfWeek,
    pub time: TimeOfDay,
}

/// Why the gate refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Date or time not supplied
    MissingFields,
    InvalidDate { value: String },
    InvalidTime { value: String },
    DateInPast { date: NaiveDate, earliest: NaiveDate },
    /// The resolved weekday is absent from the table or marked unavailable
    DayUnavailable { day: DayOfWeek },
    OutsideHours {
        day: DayOfWeek,
        start: TimeOfDay,
        end: TimeOfDay,
    },
    /// The day is available but its stored hours don't parse
    MalformedWindow { day: DayOfWeek },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingFields => write!(f, "missing fields"),
            RejectReason::InvalidDate { value } => write!(f, "invalid date '{}'", value),
            RejectReason::InvalidTime { value } => write!(f, "invalid time '{}'", value),
            RejectReason::DateInPast { date, earliest } => {
                write!(f, "date {} is before {}", date, earliest)
            }
            RejectReason::DayUnavailable { day } => write!(f, "provider not available on {}", day),
            RejectReason::OutsideHours { start, end, .. } => {
                write!(f, "outside available hours {}\u{2013}{}", start, end)
            }
            RejectReason::MalformedWindow { day } => {
                write!(f, "provider availability for {} is malformed", day)
            }
        }
    }
}

/// Outcome of a single gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed(ValidatedBooking),
    Reject(RejectReason),
}

impl GateDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GateDecision::Proceed(_))
    }

    pub fn booking(&self) -> Option<&ValidatedBooking> {
        match self {
            GateDecision::Proceed(booking) => Some(booking),
            GateDecision::Reject(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            GateDecision::Proceed(_) => None,
            GateDecision::Reject(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_count_as_missing() {
        let request = BookingRequest::new("  ", "10:00");
        assert_eq!(request.date_field(), None);
        assert_eq!(request.time_field(), Some("10:00"));
        assert!(!request.has_required_fields());

        assert!(!BookingRequest::default().has_required_fields());
    }

    #[test]
    fn test_request_deserializes_with_missing_fields() {
        let request: BookingRequest = serde_json::from_str(r#"{"date": "2024-05-03"}"#).unwrap();
        assert_eq!(request.date_field(), Some("2024-05-03"));
        assert_eq!(request.time, None);
    }

    #[test]
    fn test_reason_messages() {
        let start = "10:00".parse().unwrap();
        let end = "14:00".parse().unwrap();
        let outside = RejectReason::OutsideHours {
            day: DayOfWeek::Friday,
            start,
            end,
        };
        assert_eq!(outside.to_string(), "outside available hours 10:00\u{2013}14:00");

        let unavailable = RejectReason::DayUnavailable {
            day: DayOfWeek::Saturday,
        };
        assert_eq!(unavailable.to_string(), "provider not available on Saturday");
        assert_eq!(RejectReason::MissingFields.to_string(), "missing fields");
    }
}
