//! # slavic_calendar
//!
//! Converts civil (Gregorian) dates into a position in a nine-month
//! "Slavic" calendar. The custom year starts on September 21, months are
//! 40 or 41 days long, and years are counted from a mythic epoch 5508
//! years before the civil era.
//!
//! ```
//! use chrono::NaiveDate;
//! use slavic_calendar::convert_date;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 9, 21).unwrap();
//! let position = convert_date(date);
//! assert_eq!(position.to_string(), "1 Ramhat 7533");
//! ```

mod clock;
mod config;
mod consts;
mod months;
mod notes;
mod oracle;
mod prelude;

pub use clock::{Calendar, Clock, FixedClock, SystemClock};
pub use config::{CalendarConfig, ConfigError, Overflow};
pub use consts::*;
pub use months::{
    DayOfMonth, Element, MONTHS, MonthDefinition, MonthIndex, month_by_name, total_days,
};
pub use notes::{JsonNoteStore, MemoryNoteStore, NoteError, NoteKey, NoteStore};
pub use oracle::{
    ApiError, Candidate, Content, FALLBACK_ERROR, FALLBACK_SILENT, GenerationConfig, Oracle,
    OracleError, OraclePrompt, OracleRequest, OracleResponse, Part, Persona, consult,
};

use crate::prelude::*;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use consts::GREGORIAN_CYCLE_YEARS;
use months::{days_before, locate};
use std::str::FromStr;
use tracing::{debug, trace};

/// A position in the custom calendar.
///
/// Ordered by epoch year, then month, then day. This is chronological except
/// under [`Overflow::Wrap`], where the last civil day of a custom year that
/// spans a February 29 maps to day 1 of the first month and so compares equal
/// to the anchor date 365 days before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "{day} {} {epoch_year}", "month.name()")]
pub struct CalendarPosition {
    epoch_year: i32,
    month: MonthIndex,
    day: DayOfMonth,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParseError {
    #[display(fmt = "Invalid format: {_0}")]
    InvalidFormat(String),
    #[display(fmt = "Invalid month index: {} (must be 0-{})", "_0", "MONTH_COUNT - 1")]
    InvalidMonthIndex(u8),
    #[display(fmt = "Unknown month: {_0}")]
    UnknownMonth(String),
    #[display(fmt = "Invalid day {day} for month {month} (max {max})")]
    InvalidDay { month: u8, day: u8, max: u8 },
    #[display(fmt = "Empty input")]
    EmptyInput,
}

impl std::error::Error for ParseError {}

impl CalendarPosition {
    /// Creates a position, checking the day against the month's length
    ///
    /// # Errors
    /// Returns `ParseError::InvalidDay` if `day` does not exist in `month`.
    pub fn new(epoch_year: i32, month: MonthIndex, day: u8) -> Result<Self, ParseError> {
        let day = DayOfMonth::new(day, month)?;
        Ok(Self {
            epoch_year,
            month,
            day,
        })
    }

    pub const fn month(&self) -> MonthIndex {
        self.month
    }

    pub const fn day(&self) -> DayOfMonth {
        self.day
    }

    pub const fn epoch_year(&self) -> i32 {
        self.epoch_year
    }

    /// The static definition of the current month
    pub fn month_definition(&self) -> &'static MonthDefinition {
        self.month.definition()
    }

    /// One-based day within the custom year (1..=365)
    pub fn day_of_year(&self) -> u32 {
        days_before(self.month) + u32::from(self.day.get())
    }

    /// Days left in the month after this one
    pub fn days_remaining_in_month(&self) -> u8 {
        self.month.days() - self.day.get()
    }

    /// Key under which a note for this day is stored
    pub const fn note_key(&self) -> NoteKey {
        NoteKey::new(self.month, self.day)
    }
}

impl FromStr for CalendarPosition {
    type Err = ParseError;

    /// Parses the display form, `"{day} {month name} {epoch year}"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let [day, name, year] = parts.as_slice() else {
            return Err(ParseError::InvalidFormat(format!(
                "expected '<day> <month> <year>', found {} parts",
                parts.len()
            )));
        };

        let day = day
            .parse::<u8>()
            .map_err(|_| ParseError::InvalidFormat((*day).to_owned()))?;
        let month =
            month_by_name(name).ok_or_else(|| ParseError::UnknownMonth((*name).to_owned()))?;
        let epoch_year = year
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidFormat((*year).to_owned()))?;

        Self::new(epoch_year, month, day)
    }
}

impl serde::Serialize for CalendarPosition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for CalendarPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Maps civil dates to calendar positions under a given configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converter {
    anchor_month: u8,
    anchor_day: u8,
    epoch_offset: i32,
    overflow: Overflow,
}

impl Default for Converter {
    fn default() -> Self {
        Self {
            anchor_month: ANCHOR_MONTH,
            anchor_day: ANCHOR_DAY,
            epoch_offset: EPOCH_OFFSET,
            overflow: Overflow::default(),
        }
    }
}

impl Converter {
    /// Builds a converter from a configuration
    ///
    /// # Errors
    /// Returns `ConfigError` if the anchor date does not exist in a common year.
    pub fn new(config: &CalendarConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            anchor_month: config.anchor_month,
            anchor_day: config.anchor_day,
            epoch_offset: config.epoch_offset,
            overflow: config.overflow,
        })
    }

    pub const fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// The anchor date in civil `year`, if chrono can represent it.
    fn anchor_in(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            year,
            u32::from(self.anchor_month),
            u32::from(self.anchor_day),
        )
    }

    /// Whether `date` falls on or after the anchor in its own civil year.
    fn on_or_after_anchor(&self, date: NaiveDate) -> bool {
        self.anchor_in(date.year()).is_none_or(|anchor| date >= anchor)
    }

    /// Days since the most recent anchor, `None` when that anchor lies
    /// before `NaiveDate::MIN`.
    fn days_since_anchor(&self, date: NaiveDate) -> Option<i64> {
        let anchor = if self.on_or_after_anchor(date) {
            self.anchor_in(date.year())?
        } else {
            self.anchor_in(date.year() - 1)?
        };
        Some(date.signed_duration_since(anchor).num_days())
    }

    /// Whole days between the most recent anchor and `date`.
    ///
    /// Can reach 365 when the custom year spans a February 29.
    pub fn elapsed_days(&self, date: NaiveDate) -> u32 {
        let days = self.days_since_anchor(date).or_else(|| {
            // Same distance one Gregorian cycle later
            let shifted = date.with_year(date.year() + GREGORIAN_CYCLE_YEARS)?;
            self.days_since_anchor(shifted)
        });
        days.and_then(|d| u32::try_from(d).ok()).unwrap_or(0)
    }

    /// Civil year shifted by the epoch offset, plus one from the anchor onward.
    ///
    /// Saturates at the bounds of `i32` for extreme offsets.
    pub fn epoch_year(&self, date: NaiveDate) -> i32 {
        date.year()
            .saturating_add(self.epoch_offset)
            .saturating_add(i32::from(self.on_or_after_anchor(date)))
    }

    pub fn convert(&self, timestamp: NaiveDateTime) -> CalendarPosition {
        self.convert_date(timestamp.date())
    }

    pub fn convert_date(&self, date: NaiveDate) -> CalendarPosition {
        let elapsed = self.elapsed_days(date);
        let day_of_year0 = if elapsed < DAYS_IN_YEAR {
            elapsed
        } else {
            debug!(%date, elapsed, overflow = ?self.overflow, "elapsed days past end of year");
            match self.overflow {
                Overflow::Clamp => DAYS_IN_YEAR - 1,
                Overflow::Wrap => elapsed % DAYS_IN_YEAR,
            }
        };

        let (month, day) = locate(day_of_year0);
        let position = CalendarPosition {
            epoch_year: self.epoch_year(date),
            month,
            day,
        };
        trace!(%date, %position, "converted");
        position
    }
}

/// Converts a civil timestamp with the default calendar settings.
pub fn convert(timestamp: NaiveDateTime) -> CalendarPosition {
    Converter::default().convert(timestamp)
}

/// Converts a civil date with the default calendar settings.
pub fn convert_date(date: NaiveDate) -> CalendarPosition {
    Converter::default().convert_date(date)
}
