//! Booking gate.
//!
//! Decides once per submission whether a booking request may be handed on
//! to the booking collaborator. The gate itself never persists or transmits.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::availability::{check_slot, SlotCheck};
use crate::models::{
    parse_iso_date, BookingRequest, GateDecision, RejectReason, TimeOfDay, ValidatedBooking,
    WeeklyAvailability,
};

/// Gate state machine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Gate already decided; reset before the next submission")]
    AlreadyDecided,
}

/// Errors from [`BookingGate::submit`].
#[derive(Error, Debug)]
pub enum SubmitError<E> {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("Booking collaborator failed: {0}")]
    Sink(E),
}

/// Receives bookings that passed the gate.
pub trait BookingSink {
    type Output;
    type Error;

    fn accept(&mut self, booking: ValidatedBooking) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> BookingSink for F
where
    F: FnMut(ValidatedBooking) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn accept(&mut self, booking: ValidatedBooking) -> Result<T, E> {
        self(booking)
    }
}

/// What happened to a submitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    /// Passed the gate; carries the collaborator's result
    Forwarded(T),
    Rejected(RejectReason),
}

/// Gate lifecycle: `Idle` until a submission is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Decided(GateDecision),
}

/// Two-state booking gate.
#[derive(Debug, Clone)]
pub struct BookingGate {
    earliest: Option<NaiveDate>,
    state: GateState,
}

impl Default for BookingGate {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingGate {
    pub fn new() -> Self {
        Self {
            earliest: None,
            state: GateState::Idle,
        }
    }

    /// Reject dates before `earliest` (usually today).
    pub fn not_before(mut self, earliest: NaiveDate) -> Self {
        self.earliest = Some(earliest);
        self
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn decision(&self) -> Option<&GateDecision> {
        match &self.state {
            GateState::Decided(decision) => Some(decision),
            GateState::Idle => None,
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self.state, GateState::Decided(_))
    }

    /// Return to `Idle` for the next submission.
    pub fn reset(&mut self) {
        self.state = GateState::Idle;
    }

    /// Decide the request. Fails if the gate has already decided.
    pub fn decide(
        &mut self,
        request: &BookingRequest,
        availability: &WeeklyAvailability,
    ) -> Result<GateDecision, GateError> {
        if self.is_decided() {
            return Err(GateError::AlreadyDecided);
        }

        let decision = evaluate_request(request, availability, self.earliest);
        self.state = GateState::Decided(decision.clone());
        Ok(decision)
    }

    /// Decide the request and, only if it proceeds, hand it to `sink`.
    pub fn submit<S: BookingSink>(
        &mut self,
        request: &BookingRequest,
        availability: &WeeklyAvailability,
        sink: &mut S,
    ) -> Result<Submission<S::Output>, SubmitError<S::Error>> {
        match self.decide(request, availability)? {
            GateDecision::Proceed(booking) => sink
                .accept(booking)
                .map(Submission::Forwarded)
                .map_err(SubmitError::Sink),
            GateDecision::Reject(reason) => Ok(Submission::Rejected(reason)),
        }
    }
}

/// Stateless decision for a single request.
///
/// Order: required fields, date/time parsing, earliest date, then the
/// availability check. The reject reason names the day when the day itself
/// is closed, otherwise the open interval.
pub fn evaluate_request(
    request: &BookingRequest,
    availability: &WeeklyAvailability,
    earliest: Option<NaiveDate>,
) -> GateDecision {
    let (raw_date, raw_time) = match (request.date_field(), request.time_field()) {
        (Some(date), Some(time)) => (date, time),
        _ => return GateDecision::Reject(RejectReason::MissingFields),
    };

    let date = match parse_iso_date(raw_date) {
        Ok(date) => date,
        Err(_) => {
            return GateDecision::Reject(RejectReason::InvalidDate {
                value: raw_date.to_string(),
            })
        }
    };

    let time: TimeOfDay = match raw_time.parse() {
        Ok(time) => time,
        Err(_) => {
            return GateDecision::Reject(RejectReason::InvalidTime {
                value: raw_time.to_string(),
            })
        }
    };

    if let Some(earliest) = earliest {
        if date < earliest {
            return GateDecision::Reject(RejectReason::DateInPast { date, earliest });
        }
    }

    let decision = match check_slot(availability, date, time) {
        SlotCheck::Available { day } => GateDecision::Proceed(ValidatedBooking { date, day, time }),
        SlotCheck::DayUnavailable { day } => GateDecision::Reject(RejectReason::DayUnavailable { day }),
        SlotCheck::OutsideHours { day, start, end } => {
            GateDecision::Reject(RejectReason::OutsideHours { day, start, end })
        }
        SlotCheck::MalformedWindow { day } => {
            GateDecision::Reject(RejectReason::MalformedWindow { day })
        }
    };

    debug!(%date, %time, proceed = decision.is_proceed(), "booking gate decided");
    decision
}
