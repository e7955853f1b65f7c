//! Provider and appointment records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::availability::{TimeOfDay, WeeklyAvailability};

/// A bookable provider (typically a doctor) and their weekly hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub provider_id: String,
    pub name: String,
    pub availability: WeeklyAvailability,
}

impl Provider {
    /// New provider with the default (all days closed) table.
    pub fn new(provider_id: String, name: String) -> Self {
        Self {
            provider_id,
            name,
            availability: WeeklyAvailability::default(),
        }
    }
}

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(AppointmentStatus::Pending),
            "Completed" => Some(AppointmentStatus::Completed),
            "Cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Cancelled appointments no longer hold their slot.
    pub fn holds_slot(self) -> bool {
        self != AppointmentStatus::Cancelled
    }
}

/// A booked appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub appointment_id: String,
    pub provider_id: String,
    pub patient_id: String,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub status: AppointmentStatus,
    pub created_at: String,
}

impl Appointment {
    /// Create a pending appointment.
    pub fn new(provider_id: String, patient_id: String, date: NaiveDate, time: TimeOfDay) -> Self {
        Self {
            appointment_id: uuid::Uuid::new_v4().to_string(),
            provider_id,
            patient_id,
            date,
            time,
            status: AppointmentStatus::Pending,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn holds_slot(&self) -> bool {
        self.status.holds_slot()
    }
}
