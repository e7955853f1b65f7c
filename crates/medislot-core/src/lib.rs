//! Medislot Core Library
//!
//! Provider availability evaluation and appointment booking gate.
//!
//! # Architecture
//!
//! ```text
//! Booking form {date, time}
//!          │
//!          ▼
//!   ┌──────────────┐   WeeklyAvailability (per provider)
//!   │ Booking Gate │◄──────────────────────────────────
//!   └──────┬───────┘
//!          │ Idle → Decided
//!    ┌─────┴──────┐
//!    ▼            ▼
//! Reject(reason)  Proceed
//!                   │
//!                   ▼
//!             Slot Search (5-min steps, ≤ 12 attempts)
//!                   │
//!                   ▼
//!             Appointment recorded
//! ```
//!
//! # Core Principle
//!
//! **Slot evaluation is pure.** Day lookup (Sunday = 0) plus a minute-of-day
//! interval check, inclusive at both ends, wrapping past midnight when the
//! end time is earlier than the start time.
//!
//! # Modules
//!
//! - [`models`]: Domain types (WeeklyAvailability, DayWindow, BookingRequest, etc.)
//! - [`availability`]: Slot evaluator
//! - [`booking`]: Booking gate, slot search and booking service
//! - [`db`]: SQLite store for providers and appointments
//! - [`config`]: Environment configuration
//! - [`logging`]: Tracing subscriber setup

pub mod availability;
pub mod booking;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use availability::{check_slot, is_slot_available, SlotCheck};
pub use booking::{BookingGate, BookingOutcome, BookingService, SlotFinder, SlotOutcome};
pub use config::BookingConfig;
pub use db::Database;
pub use models::{
    Appointment, AppointmentStatus, BookingRequest, DayOfWeek, DayWindow, GateDecision, Provider,
    RejectReason, TimeOfDay, ValidatedBooking, WeeklyAvailability,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedislotError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for MedislotError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => MedislotError::NotFound(what),
            other => MedislotError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for MedislotError {
    fn from(e: serde_json::Error) -> Self {
        MedislotError::SerializationError(e.to_string())
    }
}

impl From<booking::BookingError> for MedislotError {
    fn from(e: booking::BookingError) -> Self {
        match e {
            booking::BookingError::Database(db) => db.into(),
            booking::BookingError::UnknownProvider(id) => {
                MedislotError::NotFound(format!("provider {}", id))
            }
            e @ booking::BookingError::InvalidAvailability { .. } => {
                MedislotError::InvalidInput(e.to_string())
            }
            booking::BookingError::Gate(gate) => MedislotError::InvalidInput(gate.to_string()),
        }
    }
}

impl From<models::AvailabilityError> for MedislotError {
    fn from(e: models::AvailabilityError) -> Self {
        MedislotError::InvalidInput(e.to_string())
    }
}

impl From<models::TimeParseError> for MedislotError {
    fn from(e: models::TimeParseError) -> Self {
        MedislotError::InvalidInput(e.to_string())
    }
}

impl From<logging::LoggingError> for MedislotError {
    fn from(e: logging::LoggingError) -> Self {
        MedislotError::ConfigError(e.to_string())
    }
}

impl From<anyhow::Error> for MedislotError {
    fn from(e: anyhow::Error) -> Self {
        MedislotError::ConfigError(format!("{:#}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedislotError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedislotError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Free Functions (exported to FFI)
// =========================================================================

/// Install the tracing subscriber. Returns false if one was already set.
#[uniffi::export]
pub fn init_logging(filter: String) -> Result<bool, MedislotError> {
    Ok(logging::init_logging(&filter)?)
}

/// Evaluate a slot against an availability JSON object.
#[uniffi::export]
pub fn evaluate_slot(
    availability_json: String,
    date: String,
    time: String,
) -> Result<bool, MedislotError> {
    let availability = WeeklyAvailability::from_json(&availability_json)?;
    let date = models::parse_iso_date(&date)?;
    let time: TimeOfDay = time.parse()?;
    Ok(is_slot_available(&availability, date, time))
}

/// Check that every available day carries valid `HH:MM` hours.
#[uniffi::export]
pub fn validate_availability(availability_json: String) -> Result<(), MedislotError> {
    let availability = WeeklyAvailability::from_json(&availability_json)?;
    availability.validate()?;
    Ok(())
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MedislotCore>, MedislotError> {
    let db = Database::open(&path)?;
    Ok(MedislotCore::wrap(db, SlotFinder::default()))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MedislotCore>, MedislotError> {
    let db = Database::open_in_memory()?;
    Ok(MedislotCore::wrap(db, SlotFinder::default()))
}

/// Open the database named by `MEDISLOT_DATABASE_PATH` (in-memory when unset)
/// with slot search settings from the environment. Also installs logging
/// filtered by `MEDISLOT_LOG`.
#[uniffi::export]
pub fn open_database_from_env() -> Result<Arc<MedislotCore>, MedislotError> {
    let config = BookingConfig::from_env()?;
    config.init_logging()?;
    let db = match &config.database_path {
        Some(path) => Database::open(path)?,
        None => Database::open_in_memory()?,
    };
    Ok(MedislotCore::wrap(db, config.slot_finder()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MedislotCore {
    db: Arc<Mutex<Database>>,
    finder: SlotFinder,
}

impl MedislotCore {
    fn wrap(db: Database, finder: SlotFinder) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            finder,
        })
    }
}

#[uniffi::export]
impl MedislotCore {
    // =========================================================================
    // Provider Operations
    // =========================================================================

    /// Create or update a provider with validated weekly hours.
    pub fn set_provider_availability(
        &self,
        provider_id: String,
        name: String,
        availability_json: String,
    ) -> Result<(), MedislotError> {
        let availability = WeeklyAvailability::from_json(&availability_json)?;
        availability.validate()?;

        let db = self.db.lock()?;
        db.upsert_provider(&Provider {
            provider_id,
            name,
            availability,
        })?;
        Ok(())
    }

    /// Get a provider's weekly hours as JSON.
    pub fn get_provider_availability(
        &self,
        provider_id: String,
    ) -> Result<Option<String>, MedislotError> {
        let db = self.db.lock()?;
        let availability = db.get_provider_availability(&provider_id)?;
        Ok(availability.map(|a| a.to_json()).transpose()?)
    }

    // =========================================================================
    // Booking Operations
    // =========================================================================

    /// Run the booking gate without booking.
    pub fn check_slot(
        &self,
        provider_id: String,
        date: Option<String>,
        time: Option<String>,
    ) -> Result<FfiGateDecision, MedislotError> {
        let db = self.db.lock()?;
        let service = BookingService::new(&db).with_finder(self.finder);
        let decision = service.check(&provider_id, &BookingRequest { date, time })?;
        Ok(decision.into())
    }

    /// Gate the request and record an appointment at the first free time.
    pub fn book_appointment(
        &self,
        provider_id: String,
        patient_id: String,
        date: Option<String>,
        time: Option<String>,
    ) -> Result<FfiBookingOutcome, MedislotError> {
        let db = self.db.lock()?;
        let service = BookingService::new(&db).with_finder(self.finder);
        let outcome = service.book(&provider_id, &patient_id, &BookingRequest { date, time })?;
        Ok(outcome.into())
    }

    /// Cancel an appointment, freeing its slot.
    pub fn cancel_appointment(&self, appointment_id: String) -> Result<bool, MedislotError> {
        let db = self.db.lock()?;
        Ok(db.cancel_appointment(&appointment_id)?)
    }

    /// Appointments for a provider on a date, ordered by time.
    pub fn list_appointments(
        &self,
        provider_id: String,
        date: String,
    ) -> Result<Vec<FfiAppointment>, MedislotError> {
        let date = models::parse_iso_date(&date)?;
        let db = self.db.lock()?;
        let appointments = db.list_appointments_for_day(&provider_id, date)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe gate decision.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGateDecision {
    pub proceed: bool,
    /// Human-readable reject reason
    pub reason: Option<String>,
    /// Lowercase weekday key, when the date was resolved
    pub day: Option<String>,
}

impl From<GateDecision> for FfiGateDecision {
    fn from(decision: GateDecision) -> Self {
        match decision {
            GateDecision::Proceed(booking) => Self {
                proceed: true,
                reason: None,
                day: Some(booking.day.key().to_string()),
            },
            GateDecision::Reject(reason) => {
                let day = match &reason {
                    RejectReason::DayUnavailable { day }
                    | RejectReason::OutsideHours { day, .. }
                    | RejectReason::MalformedWindow { day } => Some(day.key().to_string()),
                    _ => None,
                };
                Self {
                    proceed: false,
                    reason: Some(reason.to_string()),
                    day,
                }
            }
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub appointment_id: String,
    pub provider_id: String,
    pub patient_id: String,
    pub date: String,
    pub time: String,
    pub status: String,
    pub created_at: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            appointment_id: appointment.appointment_id,
            provider_id: appointment.provider_id,
            patient_id: appointment.patient_id,
            date: appointment.date.to_string(),
            time: appointment.time.to_string(),
            status: appointment.status.as_str().to_string(),
            created_at: appointment.created_at,
        }
    }
}

/// FFI-safe booking outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBookingOutcome {
    /// "booked", "rejected" or "no_free_slot"
    pub status: String,
    pub appointment: Option<FfiAppointment>,
    /// `HH:MM` the patient asked for; absent when rejected
    pub requested_time: Option<String>,
    pub rescheduled: bool,
    /// Minutes between the requested and booked times
    pub adjustment_minutes: u32,
    pub message: Option<String>,
}

impl From<BookingOutcome> for FfiBookingOutcome {
    fn from(outcome: BookingOutcome) -> Self {
        match outcome {
            BookingOutcome::Booked {
                appointment,
                requested,
                rescheduled,
                adjustment_minutes,
            } => Self {
                status: "booked".into(),
                appointment: Some(appointment.into()),
                requested_time: Some(requested.to_string()),
                rescheduled,
                adjustment_minutes,
                message: None,
            },
            BookingOutcome::Rejected(reason) => Self {
                status: "rejected".into(),
                appointment: None,
                requested_time: None,
                rescheduled: false,
                adjustment_minutes: 0,
                message: Some(reason.to_string()),
            },
            BookingOutcome::NoFreeSlot {
                requested,
                last_checked,
            } => Self {
                status: "no_free_slot".into(),
                appointment: None,
                requested_time: Some(requested.to_string()),
                rescheduled: false,
                adjustment_minutes: 0,
                message: Some(format!(
                    "No available slots found between {} and {}",
                    requested, last_checked
                )),
            },
        }
    }
}
