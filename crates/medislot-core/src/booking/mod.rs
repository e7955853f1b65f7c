//! Booking pipeline.
//!
//! Pipeline: Load Availability → Booking Gate → Slot Search → Record Appointment

mod gate;
mod slots;

pub use gate::*;
pub use slots::*;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::db::{Database, DbError};
use crate::models::{
    Appointment, AvailabilityError, BookingRequest, GateDecision, RejectReason, TimeOfDay,
    ValidatedBooking, WeeklyAvailability,
};

/// Booking errors.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider {provider_id} has invalid availability: {source}")]
    InvalidAvailability {
        provider_id: String,
        #[source]
        source: AvailabilityError,
    },

    #[error(transparent)]
    Gate(#[from] GateError),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Final result of a booking attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// Recorded; `rescheduled` is set when the requested time was taken and
    /// `adjustment_minutes` is how far the booking moved from `requested`
    Booked {
        appointment: Appointment,
        requested: TimeOfDay,
        rescheduled: bool,
        adjustment_minutes: u32,
    },
    Rejected(RejectReason),
    /// Passed the gate but every nearby time was taken
    NoFreeSlot {
        requested: TimeOfDay,
        last_checked: TimeOfDay,
    },
}

impl BookingOutcome {
    pub fn appointment(&self) -> Option<&Appointment> {
        match self {
            BookingOutcome::Booked { appointment, .. } => Some(appointment),
            _ => None,
        }
    }
}

/// Books appointments against the local store.
pub struct BookingService<'a> {
    db: &'a Database,
    finder: SlotFinder,
    earliest: Option<NaiveDate>,
}

impl<'a> BookingService<'a> {
    /// Create a service with the default slot search.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            finder: SlotFinder::default(),
            earliest: None,
        }
    }

    pub fn with_finder(mut self, finder: SlotFinder) -> Self {
        self.finder = finder;
        self
    }

    /// Reject requests dated before `earliest`.
    pub fn not_before(mut self, earliest: NaiveDate) -> Self {
        self.earliest = Some(earliest);
        self
    }

    pub fn finder(&self) -> &SlotFinder {
        &self.finder
    }

    fn gate(&self) -> BookingGate {
        match self.earliest {
            Some(earliest) => BookingGate::new().not_before(earliest),
            None => BookingGate::new(),
        }
    }

    fn load_availability(&self, provider_id: &str) -> BookingResult<WeeklyAvailability> {
        let availability = self
            .db
            .get_provider_availability(provider_id)?
            .ok_or_else(|| BookingError::UnknownProvider(provider_id.to_string()))?;
        availability
            .validate()
            .map_err(|source| BookingError::InvalidAvailability {
                provider_id: provider_id.to_string(),
                source,
            })?;
        Ok(availability)
    }

    /// Run the gate for a provider without booking anything.
    pub fn check(&self, provider_id: &str, request: &BookingRequest) -> BookingResult<GateDecision> {
        let availability = self.load_availability(provider_id)?;
        Ok(self.gate().decide(request, &availability)?)
    }

    /// Gate the request and, if it proceeds, record an appointment at the
    /// first free time at or after the requested one.
    pub fn book(
        &self,
        provider_id: &str,
        patient_id: &str,
        request: &BookingRequest,
    ) -> BookingResult<BookingOutcome> {
        let availability = self.load_availability(provider_id)?;
        let mut gate = self.gate();
        let mut reserve = |booking: ValidatedBooking| self.reserve(provider_id, patient_id, booking);

        match gate.submit(request, &availability, &mut reserve) {
            Ok(Submission::Forwarded(outcome)) => Ok(outcome),
            Ok(Submission::Rejected(reason)) => {
                info!(provider_id, %reason, "booking rejected");
                Ok(BookingOutcome::Rejected(reason))
            }
            Err(SubmitError::Gate(e)) => Err(e.into()),
            Err(SubmitError::Sink(e)) => Err(e),
        }
    }

    /// Slot search and insert run in one transaction.
    fn reserve(
        &self,
        provider_id: &str,
        patient_id: &str,
        booking: ValidatedBooking,
    ) -> BookingResult<BookingOutcome> {
        let tx = self.db.transaction()?;

        let outcome = match self.finder.find(self.db, provider_id, booking.date, booking.time)? {
            SlotOutcome::Free { time, attempts } => {
                let appointment = Appointment::new(
                    provider_id.to_string(),
                    patient_id.to_string(),
                    booking.date,
                    time,
                );
                self.db.insert_appointment(&appointment)?;
                info!(
                    provider_id,
                    appointment_id = %appointment.appointment_id,
                    date = %booking.date,
                    %time,
                    "appointment booked"
                );
                BookingOutcome::Booked {
                    appointment,
                    requested: booking.time,
                    rescheduled: attempts > 0,
                    adjustment_minutes: attempts.saturating_mul(self.finder.step_minutes()),
                }
            }
            SlotOutcome::Exhausted { last_checked } => BookingOutcome::NoFreeSlot {
                requested: booking.time,
                last_checked,
            },
        };

        tx.commit().map_err(DbError::from)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayOfWeek, DayWindow, Provider};

    fn setup_db_with_provider() -> Database {
        let db = Database::open_in_memory().unwrap();

        let mut provider = Provider::new("doc-1".into(), "Dr. Rao".into());
        provider
            .availability
            .set_day(DayOfWeek::Friday, DayWindow::open("10:00", "14:00"));
        db.upsert_provider(&provider).unwrap();

        db
    }

    #[test]
    fn test_book_inside_hours() {
        let db = setup_db_with_provider();
        let service = BookingService::new(&db);

        let outcome = service
            .book("doc-1", "pat-1", &BookingRequest::new("2024-05-03", "13:30"))
            .unwrap();

        let appointment = outcome.appointment().unwrap();
        assert_eq!(appointment.time.to_string(), "13:30");
        assert!(matches!(outcome, BookingOutcome::Booked { rescheduled: false, .. }));
        assert!(db.get_appointment(&appointment.appointment_id).unwrap().is_some());
    }

    #[test]
    fn test_second_booking_moves_forward() {
        let db = setup_db_with_provider();
        let service = BookingService::new(&db);
        let request = BookingRequest::new("2024-05-03", "11:00");

        service.book("doc-1", "pat-1", &request).unwrap();
        let outcome = service.book("doc-1", "pat-2", &request).unwrap();

        match outcome {
            BookingOutcome::Booked {
                appointment,
                requested,
                rescheduled,
                adjustment_minutes,
            } => {
                assert!(rescheduled);
                assert_eq!(requested.to_string(), "11:00");
                assert_eq!(appointment.time.to_string(), "11:05");
                assert_eq!(adjustment_minutes, 5);
            }
            other => panic!("expected booking, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_request_records_nothing() {
        let db = setup_db_with_provider();
        let service = BookingService::new(&db);

        let outcome = service
            .book("doc-1", "pat-1", &BookingRequest::new("2024-05-03", "15:00"))
            .unwrap();
        assert!(matches!(
            outcome,
            BookingOutcome::Rejected(RejectReason::OutsideHours { .. })
        ));

        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert!(db.list_appointments_for_day("doc-1", date).unwrap().is_empty());
    }

    #[test]
    fn test_no_free_slot() {
        let db = setup_db_with_provider();
        let service = BookingService::new(&db).with_finder(SlotFinder::new(5, 1));
        let request = BookingRequest::new("2024-05-03", "12:00");

        service.book("doc-1", "pat-1", &request).unwrap();
        let outcome = service.book("doc-1", "pat-2", &request).unwrap();
        assert_eq!(
            outcome,
            BookingOutcome::NoFreeSlot {
                requested: "12:00".parse().unwrap(),
                last_checked: "12:05".parse().unwrap(),
            }
        );
    }

    #[test]
    fn test_unknown_provider() {
        let db = setup_db_with_provider();
        let service = BookingService::new(&db);
        let result = service.book("nobody", "pat-1", &BookingRequest::new("2024-05-03", "11:00"));
        assert!(matches!(result, Err(BookingError::UnknownProvider(ref id)) if id == "nobody"));
    }

    #[test]
    fn test_check_does_not_book() {
        let db = setup_db_with_provider();
        let service = BookingService::new(&db);

        let decision = service
            .check("doc-1", &BookingRequest::new("2024-05-04", "11:00"))
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Reject(RejectReason::DayUnavailable {
                day: DayOfWeek::Saturday
            })
        );
    }

    #[test]
    fn test_not_before_rejects_past_dates() {
        let db = setup_db_with_provider();
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let service = BookingService::new(&db).not_before(today);

        let outcome = service
            .book("doc-1", "pat-1", &BookingRequest::new("2024-05-03", "11:00"))
            .unwrap();
        assert!(matches!(
            outcome,
            BookingOutcome::Rejected(RejectReason::DateInPast { .. })
        ));
    }

    #[test]
    fn test_malformed_stored_availability_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let mut provider = Provider::new("doc-1".into(), "Dr. Rao".into());
        provider
            .availability
            .set_day(DayOfWeek::Friday, DayWindow::open("9am", "5pm"));
        db.upsert_provider(&provider).unwrap();

        let service = BookingService::new(&db);
        let request = BookingRequest::new("2024-05-03", "11:00");

        assert!(matches!(
            service.check("doc-1", &request),
            Err(BookingError::InvalidAvailability { .. })
        ));
        assert!(matches!(
            service.book("doc-1", "pat-1", &request),
            Err(BookingError::InvalidAvailability { .. })
        ));
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert!(db.list_appointments_for_day("doc-1", date).unwrap().is_empty());
    }

    #[test]
    fn test_adjustment_follows_step_size() {
        let db = setup_db_with_provider();
        let service = BookingService::new(&db).with_finder(SlotFinder::new(15, 4));
        let request = BookingRequest::new("2024-05-03", "11:00");

        service.book("doc-1", "pat-1", &request).unwrap();
        service.book("doc-1", "pat-2", &request).unwrap();
        let third = service.book("doc-1", "pat-3", &request).unwrap();

        match third {
            BookingOutcome::Booked {
                appointment,
                adjustment_minutes,
                ..
            } => {
                assert_eq!(appointment.time.to_string(), "11:30");
                assert_eq!(adjustment_minutes, 30);
            }
            other => panic!("expected booking, got {:?}", other),
        }
    }
}
