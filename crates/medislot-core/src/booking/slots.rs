//! Next-free-slot search.
//!
//! Starting at the requested time, walk forward in fixed steps until a time
//! with no active appointment is found or the attempt budget runs out.

use std::collections::HashSet;
use std::convert::Infallible;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::TimeOfDay;

/// Source of truth for which provider times are already taken.
pub trait AppointmentLedger {
    type Error;

    /// Whether an active (non-cancelled) appointment holds this slot.
    fn is_booked(
        &self,
        provider_id: &str,
        date: NaiveDate,
        time: TimeOfDay,
    ) -> Result<bool, Self::Error>;
}

/// In-memory ledger, mainly for tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    booked: HashSet<(String, NaiveDate, TimeOfDay)>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn book(&mut self, provider_id: &str, date: NaiveDate, time: TimeOfDay) {
        self.booked.insert((provider_id.to_string(), date, time));
    }

    /// Free a slot. Returns false if it wasn't booked.
    pub fn release(&mut self, provider_id: &str, date: NaiveDate, time: TimeOfDay) -> bool {
        self.booked.remove(&(provider_id.to_string(), date, time))
    }
}

impl AppointmentLedger for MemoryLedger {
    type Error = Infallible;

    fn is_booked(
        &self,
        provider_id: &str,
        date: NaiveDate,
        time: TimeOfDay,
    ) -> Result<bool, Infallible> {
        Ok(self.booked.contains(&(provider_id.to_string(), date, time)))
    }
}

/// Result of a slot search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// `attempts` is the number of steps taken past the requested time
    Free { time: TimeOfDay, attempts: u32 },
    /// Every candidate was taken; `last_checked` is where the search stopped
    Exhausted { last_checked: TimeOfDay },
}

impl SlotOutcome {
    pub fn time(&self) -> Option<TimeOfDay> {
        match self {
            SlotOutcome::Free { time, .. } => Some(*time),
            SlotOutcome::Exhausted { .. } => None,
        }
    }

    /// Whether a time other than the requested one was chosen.
    pub fn is_alternative(&self) -> bool {
        matches!(self, SlotOutcome::Free { attempts, .. } if *attempts > 0)
    }
}

/// Forward-stepping slot search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotFinder {
    step_minutes: u32,
    max_attempts: u32,
}

impl Default for SlotFinder {
    /// Five-minute steps for up to an hour.
    fn default() -> Self {
        Self {
            step_minutes: Self::DEFAULT_STEP_MINUTES,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl SlotFinder {
    pub const DEFAULT_STEP_MINUTES: u32 = 5;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;

    pub fn new(step_minutes: u32, max_attempts: u32) -> Self {
        Self {
            step_minutes,
            max_attempts,
        }
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Candidate times in search order. Wraps past midnight on the same date.
    pub fn candidates(&self, requested: TimeOfDay) -> impl Iterator<Item = TimeOfDay> {
        let step = self.step_minutes;
        (0..self.max_attempts).map(move |i| requested.plus_minutes(wrapped_offset(i, step)))
    }

    /// Find the first free candidate for `provider_id` on `date`.
    pub fn find<L: AppointmentLedger>(
        &self,
        ledger: &L,
        provider_id: &str,
        date: NaiveDate,
        requested: TimeOfDay,
    ) -> Result<SlotOutcome, L::Error> {
        for (attempts, candidate) in self.candidates(requested).enumerate() {
            if !ledger.is_booked(provider_id, date, candidate)? {
                if attempts > 0 {
                    debug!(provider_id, %date, %requested, chosen = %candidate, "requested slot taken, moved forward");
                }
                return Ok(SlotOutcome::Free {
                    time: candidate,
                    attempts: attempts as u32,
                });
            }
        }

        let last_checked =
            requested.plus_minutes(wrapped_offset(self.max_attempts, self.step_minutes));
        debug!(provider_id, %date, %requested, %last_checked, "no free slot in search window");
        Ok(SlotOutcome::Exhausted { last_checked })
    }
}

/// `steps * step_minutes`, reduced to within one day.
fn wrapped_offset(steps: u32, step_minutes: u32) -> u32 {
    (steps as u64 * step_minutes as u64 % TimeOfDay::MINUTES_PER_DAY as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    #[test]
    fn test_requested_slot_free() {
        let ledger = MemoryLedger::new();
        let outcome = SlotFinder::default()
            .find(&ledger, "doc-1", day(), t("10:00"))
            .unwrap();
        assert_eq!(
            outcome,
            SlotOutcome::Free {
                time: t("10:00"),
                attempts: 0
            }
        );
        assert!(!outcome.is_alternative());
    }

    #[test]
    fn test_moves_forward_past_booked_slots() {
        let mut ledger = MemoryLedger::new();
        ledger.book("doc-1", day(), t("10:00"));
        ledger.book("doc-1", day(), t("10:05"));

        let outcome = SlotFinder::default()
            .find(&ledger, "doc-1", day(), t("10:00"))
            .unwrap();
        assert_eq!(outcome.time(), Some(t("10:10")));
        assert!(outcome.is_alternative());
    }

    #[test]
    fn test_other_providers_and_dates_do_not_conflict() {
        let mut ledger = MemoryLedger::new();
        ledger.book("doc-2", day(), t("10:00"));
        ledger.book("doc-1", day().succ_opt().unwrap(), t("10:00"));

        let outcome = SlotFinder::default()
            .find(&ledger, "doc-1", day(), t("10:00"))
            .unwrap();
        assert_eq!(outcome.time(), Some(t("10:00")));
    }

    #[test]
    fn test_exhausted_reports_last_checked() {
        let mut ledger = MemoryLedger::new();
        let finder = SlotFinder::default();
        for candidate in finder.candidates(t("10:00")) {
            ledger.book("doc-1", day(), candidate);
        }

        let outcome = finder.find(&ledger, "doc-1", day(), t("10:00")).unwrap();
        assert_eq!(
            outcome,
            SlotOutcome::Exhausted {
                last_checked: t("11:00")
            }
        );
    }

    #[test]
    fn test_release_frees_slot() {
        let mut ledger = MemoryLedger::new();
        ledger.book("doc-1", day(), t("10:00"));
        assert!(ledger.release("doc-1", day(), t("10:00")));
        assert!(!ledger.release("doc-1", day(), t("10:00")));
    }

    #[test]
    fn test_candidates_wrap_past_midnight() {
        let finder = SlotFinder::new(5, 3);
        let candidates: Vec<String> = finder
            .candidates(t("23:55"))
            .map(|c| c.to_string())
            .collect();
        assert_eq!(candidates, vec!["23:55", "00:00", "00:05"]);
    }

    #[test]
    fn test_whole_day_steps_do_not_overflow() {
        // A step of exactly 1000 days lands back on the requested time every attempt
        let finder = SlotFinder::new(1_440_000, 4000);
        let mut ledger = MemoryLedger::new();
        ledger.book("doc-1", day(), t("10:00"));

        let outcome = finder.find(&ledger, "doc-1", day(), t("10:00")).unwrap();
        assert_eq!(
            outcome,
            SlotOutcome::Exhausted {
                last_checked: t("10:00")
            }
        );
    }

    #[test]
    fn test_max_step_and_attempts_stay_within_day() {
        let finder = SlotFinder::new(u32::MAX, u32::MAX);
        let candidates: Vec<TimeOfDay> = finder.candidates(t("10:00")).take(3).collect();
        assert_eq!(candidates[0], t("10:00"));
        assert!(candidates
            .iter()
            .all(|c| c.minutes() < TimeOfDay::MINUTES_PER_DAY));
    }
}
