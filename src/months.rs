use crate::ParseError;
use crate::consts::{DAYS_IN_YEAR, MIN_DAY, MONTH_COUNT};
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU8;

/// Elemental tag carried by each month. Purely descriptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    #[display(fmt = "Fire")]
    Fire,
    #[display(fmt = "Earth")]
    Earth,
    #[display(fmt = "Water")]
    Water,
    #[display(fmt = "Air")]
    Air,
}

/// One of the nine fixed-length divisions of the custom year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MonthDefinition {
    pub name: &'static str,
    pub days: u8,
    pub meaning: &'static str,
    pub deity: &'static str,
    pub element: Element,
}

const MONTH_TABLE: [MonthDefinition; MONTH_COUNT as usize] = [
    month("Ramhat", 41, "Divine Beginning", "Ramhat", Element::Fire),
    month("Ajlet", 40, "New Gifts", "Rozana", Element::Earth),
    month("Bejlet", 41, "White Light", "Balwan", Element::Water),
    month("Gejlet", 40, "Blizzard and Cold", "Marzanna", Element::Air),
    month("Dajlet", 41, "Rebirth of Nature", "Siemargl", Element::Fire),
    month("Elet", 40, "Sowing and Hope", "Waruna", Element::Earth),
    month("Vejlet", 41, "Wind and Change", "Svarog", Element::Water),
    month("Hejlet", 40, "Gathering of Gifts", "Rod", Element::Air),
    month("Tajlet", 41, "Rest", "Kupala", Element::Fire),
];

/// The month table, in calendar order. Ramhat starts on the anchor date.
pub static MONTHS: [MonthDefinition; MONTH_COUNT as usize] = MONTH_TABLE;

const fn month(
    name: &'static str,
    days: u8,
    meaning: &'static str,
    deity: &'static str,
    element: Element,
) -> MonthDefinition {
    MonthDefinition {
        name,
        days,
        meaning,
        deity,
        element,
    }
}

/// Sum of all month lengths.
pub const fn total_days() -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < MONTH_TABLE.len() {
        total += MONTH_TABLE[i].days as u32;
        i += 1;
    }
    total
}

const _: () = assert!(total_days() == DAYS_IN_YEAR, "month lengths must cover the year");

/// Longest month in the table, used for context-free day validation.
const MAX_MONTH_DAYS: u8 = 41;

/// A month position guaranteed to be in the range `0..MONTH_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MonthIndex(u8);

impl MonthIndex {
    /// First month of the year (Ramhat)
    pub const FIRST: Self = Self(0);
    /// Last month of the year (Tajlet)
    pub const LAST: Self = Self(MONTH_COUNT - 1);

    /// Creates a new `MonthIndex`, validating that it's below `MONTH_COUNT`
    ///
    /// # Errors
    /// Returns `ParseError::InvalidMonthIndex` if the value is `>= MONTH_COUNT`.
    pub fn new(value: u8) -> Result<Self, ParseError> {
        if value >= MONTH_COUNT {
            return Err(ParseError::InvalidMonthIndex(value));
        }
        Ok(Self(value))
    }

    /// Returns the index as u8
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The static definition for this month
    #[inline]
    pub fn definition(self) -> &'static MonthDefinition {
        &MONTHS[self.0 as usize]
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }

    pub fn days(self) -> u8 {
        self.definition().days
    }

    /// The following month, wrapping from Tajlet back to Ramhat.
    pub const fn next(self) -> Self {
        Self((self.0 + 1) % MONTH_COUNT)
    }

    /// All months in calendar order
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..MONTH_COUNT).map(Self)
    }
}

impl TryFrom<u8> for MonthIndex {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonthIndex> for u8 {
    fn from(month: MonthIndex) -> Self {
        month.0
    }
}

impl fmt::Display for MonthIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Looks a month up by name, ignoring ASCII case.
pub fn month_by_name(name: &str) -> Option<MonthIndex> {
    let name = name.trim();
    MonthIndex::all().find(|m| m.name().eq_ignore_ascii_case(name))
}

/// A day value guaranteed to be valid for a given month
/// Uses `NonZeroU8` internally, so 0 is not a valid day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfMonth(NonZeroU8);

impl DayOfMonth {
    /// Creates a new day, validating that it's non-zero and within the month's length
    ///
    /// # Errors
    /// Returns `ParseError::InvalidDay` if the value is 0 or exceeds the month's day count.
    pub fn new(value: u8, month: MonthIndex) -> Result<Self, ParseError> {
        let max = month.days();
        let err = ParseError::InvalidDay {
            month: month.get(),
            day: value,
            max,
        };
        let non_zero = NonZeroU8::new(value).ok_or_else(|| err.clone())?;
        if value > max {
            return Err(err);
        }
        Ok(Self(non_zero))
    }

    /// Day `offset + 1`, saturating. Callers guarantee the offset fits the month.
    const fn from_offset(offset: u8) -> Self {
        Self(NonZeroU8::MIN.saturating_add(offset))
    }

    /// Returns the day value as u8
    #[inline]
    pub const fn get(self) -> u8 {
        self.0.get()
    }
}

impl TryFrom<u8> for DayOfMonth {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // Without a month only the longest month's bound can be checked
        if !(MIN_DAY..=MAX_MONTH_DAYS).contains(&value) {
            return Err(ParseError::InvalidDay {
                month: 0,
                day: value,
                max: MAX_MONTH_DAYS,
            });
        }
        Ok(Self::from_offset(value - MIN_DAY))
    }
}

impl From<DayOfMonth> for u8 {
    fn from(day: DayOfMonth) -> Self {
        day.0.get()
    }
}

impl fmt::Display for DayOfMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps a zero-based day of the custom year to its month and day.
///
/// Offsets past the end of the table land on the last day of the last month.
pub(crate) fn locate(day_of_year0: u32) -> (MonthIndex, DayOfMonth) {
    let mut remaining = day_of_year0;
    for month in MonthIndex::all() {
        let days = month.days();
        match u8::try_from(remaining) {
            Ok(offset) if offset < days => return (month, DayOfMonth::from_offset(offset)),
            _ => remaining -= u32::from(days),
        }
    }
    (
        MonthIndex::LAST,
        DayOfMonth::from_offset(MonthIndex::LAST.days() - 1),
    )
}

/// Days before `month` in the custom year.
pub(crate) fn days_before(month: MonthIndex) -> u32 {
    MonthIndex::all()
        .take_while(|m| *m < month)
        .map(|m| u32::from(m.days()))
        .sum()
}
