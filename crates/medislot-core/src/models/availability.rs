//! Weekly availability models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wall-clock and calendar parse errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Availability table validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Missing start or end time for {0}")]
    MissingTimes(DayOfWeek),

    #[error("Invalid hours for {day}: {source}")]
    InvalidTime {
        day: DayOfWeek,
        #[source]
        source: TimeParseError,
    },
}

/// Day of the week. Index 0 is Sunday, independent of locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    /// All days, Sunday first.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    /// Day for a Sunday-based index (0..=6).
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Sunday-based index of this day.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Day of the week a calendar date falls on.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::ALL[date.weekday().num_days_from_sunday() as usize]
    }

    /// Lowercase key used in availability JSON.
    pub fn key(self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "sunday",
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
        }
    }

    /// Capitalised name for user-facing messages.
    pub fn display_name(self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Local wall-clock time in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MINUTES_PER_DAY: u16 = 24 * 60;

    /// Build from hour (0-23) and minute (0-59).
    pub fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour as u16 * 60 + minute as u16))
        } else {
            None
        }
    }

    /// Build from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < Self::MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }

    /// Advance by `minutes`, wrapping past midnight.
    pub fn plus_minutes(self, minutes: u32) -> Self {
        let day = Self::MINUTES_PER_DAY as u32;
        let total = (self.0 as u32 + minutes % day) % day;
        Self(total as u16)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    /// Strict `HH:MM`: two digits each side.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeParseError::InvalidTime(s.to_string());

        let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hours) || !two_digits(minutes) {
            return Err(invalid());
        }

        let hour: u8 = hours.parse().map_err(|_| invalid())?;
        let minute: u8 = minutes.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an ISO calendar date. A full ISO datetime is accepted; only the
/// date part is used.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, TimeParseError> {
    let trimmed = value.trim();
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| TimeParseError::InvalidDate(value.to_string()))
}

/// Whether `time` lies in `[start, end]`, wrapping past midnight when
/// `end < start`. Both ends are inclusive.
pub fn window_contains(start: TimeOfDay, end: TimeOfDay, time: TimeOfDay) -> bool {
    if end < start {
        time >= start || time <= end
    } else {
        start <= time && time <= end
    }
}

/// Open interval for a single weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWindow {
    pub is_available: bool,
    /// `HH:MM`; empty on unfilled registration forms
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl DayWindow {
    /// An available window.
    pub fn open(start_time: &str, end_time: &str) -> Self {
        Self {
            is_available: true,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }

    /// An unavailable day with blank hours.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Parsed start and end times.
    pub fn bounds(&self) -> Result<(TimeOfDay, TimeOfDay), TimeParseError> {
        Ok((self.start_time.parse()?, self.end_time.parse()?))
    }

    /// Whether the window spans midnight. `None` if the hours don't parse.
    pub fn wraps_midnight(&self) -> Option<bool> {
        self.bounds().ok().map(|(start, end)| end < start)
    }

    /// Whether `time` falls inside this window. Unavailable or malformed
    /// windows contain nothing.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        if !self.is_available {
            return false;
        }
        match self.bounds() {
            Ok((start, end)) => window_contains(start, end, time),
            Err(_) => false,
        }
    }
}

/// A provider's weekly availability table keyed by weekday.
///
/// Days missing from the table behave like unavailable days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyAvailability {
    days: BTreeMap<DayOfWeek, DayWindow>,
}

impl Default for WeeklyAvailability {
    /// All seven days present and unavailable.
    fn default() -> Self {
        Self {
            days: DayOfWeek::ALL
                .iter()
                .map(|day| (*day, DayWindow::closed()))
                .collect(),
        }
    }
}

impl WeeklyAvailability {
    /// Table with no days at all.
    pub fn empty() -> Self {
        Self {
            days: BTreeMap::new(),
        }
    }

    /// Builder-style day assignment.
    pub fn with_day(mut self, day: DayOfWeek, window: DayWindow) -> Self {
        self.set_day(day, window);
        self
    }

    pub fn set_day(&mut self, day: DayOfWeek, window: DayWindow) {
        self.days.insert(day, window);
    }

    pub fn day(&self, day: DayOfWeek) -> Option<&DayWindow> {
        self.days.get(&day)
    }

    /// Resolve the weekday for `date` and its window, if any.
    pub fn for_date(&self, date: NaiveDate) -> (DayOfWeek, Option<&DayWindow>) {
        let day = DayOfWeek::from_date(date);
        (day, self.day(day))
    }

    /// Days marked available, Sunday first.
    pub fn available_days(&self) -> impl Iterator<Item = DayOfWeek> + '_ {
        self.days
            .iter()
            .filter(|(_, window)| window.is_available)
            .map(|(day, _)| *day)
    }

    /// Every available day must carry parseable start and end times.
    pub fn validate(&self) -> Result<(), AvailabilityError> {
        for (day, window) in self.days.iter().filter(|(_, w)| w.is_available) {
            if window.start_time.trim().is_empty() || window.end_time.trim().is_empty() {
                return Err(AvailabilityError::MissingTimes(*day));
            }
            window
                .bounds()
                .map_err(|source| AvailabilityError::InvalidTime { day: *day, source })?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
