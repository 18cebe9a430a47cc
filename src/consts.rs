/// Civil month on which the custom year begins (September)
pub const ANCHOR_MONTH: u8 = 9;

/// Civil day of `ANCHOR_MONTH` on which the custom year begins
pub const ANCHOR_DAY: u8 = 21;

/// Years added to the civil year to obtain the epoch year
pub const EPOCH_OFFSET: i32 = 5508;

/// Number of months in the custom calendar
pub const MONTH_COUNT: u8 = 9;

/// Length of the custom year in days (no leap handling)
pub const DAYS_IN_YEAR: u32 = 365;

/// First day of a month
pub const MIN_DAY: u8 = 1;

/// Years in one Gregorian cycle; day distances repeat across it
pub(crate) const GREGORIAN_CYCLE_YEARS: i32 = 400;

/// Separator between month and day in a note key (`"3-17"`)
pub const NOTE_KEY_SEPARATOR: char = '-';
