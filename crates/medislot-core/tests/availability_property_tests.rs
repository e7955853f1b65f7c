//! Property tests for the slot evaluator.

use chrono::NaiveDate;
use medislot_core::models::{DayOfWeek, DayWindow, TimeOfDay, WeeklyAvailability};
use medislot_core::{check_slot, is_slot_available};
use proptest::prelude::*;

fn time_strategy() -> impl Strategy<Value = TimeOfDay> {
    (0u16..TimeOfDay::MINUTES_PER_DAY).prop_map(|m| TimeOfDay::from_minutes(m).unwrap())
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    // Four weeks from a known Sunday
    (0u64..28).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 5, 5)
            .unwrap()
            .checked_add_days(chrono::Days::new(offset))
            .unwrap()
    })
}

fn table_with(day: DayOfWeek, start: TimeOfDay, end: TimeOfDay) -> WeeklyAvailability {
    WeeklyAvailability::default().with_day(
        day,
        DayWindow::open(&start.to_string(), &end.to_string()),
    )
}

proptest! {
    #[test]
    fn evaluation_is_idempotent(
        date in date_strategy(),
        start in time_strategy(),
        end in time_strategy(),
        time in time_strategy(),
    ) {
        let availability = table_with(DayOfWeek::from_date(date), start, end);
        prop_assert_eq!(
            check_slot(&availability, date, time),
            check_slot(&availability, date, time)
        );
    }

    #[test]
    fn same_day_window_matches_range_check(
        date in date_strategy(),
        a in time_strategy(),
        b in time_strategy(),
        time in time_strategy(),
    ) {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let availability = table_with(DayOfWeek::from_date(date), start, end);
        let expected = start.minutes() <= time.minutes() && time.minutes() <= end.minutes();
        prop_assert_eq!(is_slot_available(&availability, date, time), expected);
    }

    #[test]
    fn wrapped_window_is_complement_of_gap(
        date in date_strategy(),
        a in time_strategy(),
        b in time_strategy(),
        time in time_strategy(),
    ) {
        prop_assume!(a != b);
        let (end, start) = if a < b { (a, b) } else { (b, a) };
        // start > end: the window wraps; the closed gap is strictly between end and start
        let availability = table_with(DayOfWeek::from_date(date), start, end);
        let in_gap = end < time && time < start;
        prop_assert_eq!(is_slot_available(&availability, date, time), !in_gap);
    }

    #[test]
    fn other_days_are_never_available(
        date in date_strategy(),
        time in time_strategy(),
    ) {
        let today = DayOfWeek::from_date(date);
        let other = DayOfWeek::from_index((today.index() + 1) % 7).unwrap();
        let availability = table_with(other, TimeOfDay::from_minutes(0).unwrap(), TimeOfDay::from_minutes(1439).unwrap());
        prop_assert!(!is_slot_available(&availability, date, time));
    }

    #[test]
    fn time_display_parses_back(time in time_strategy()) {
        let parsed: TimeOfDay = time.to_string().parse().unwrap();
        prop_assert_eq!(parsed, time);
    }
}
