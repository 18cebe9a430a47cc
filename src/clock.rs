//! Wall-clock sources and the "today" facade.

use chrono::{Local, NaiveDateTime};

use crate::{CalendarConfig, CalendarPosition, ConfigError, Converter};

/// Source of the current civil timestamp.
///
/// The timestamp is naive: whichever timezone the source reads in is the
/// one the calendar is computed for.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Reads the system clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// A converter paired with a clock.
///
/// Nothing is cached: each call to [`Calendar::today`] reads the clock again,
/// so callers refreshing once per tick always see the current day.
#[derive(Debug, Clone)]
pub struct Calendar<C> {
    converter: Converter,
    clock: C,
}

impl Calendar<SystemClock> {
    /// Default settings on the local system clock.
    pub fn system() -> Self {
        Self::new(Converter::default(), SystemClock)
    }
}

impl<C: Clock> Calendar<C> {
    pub const fn new(converter: Converter, clock: C) -> Self {
        Self { converter, clock }
    }

    /// # Errors
    /// Returns `ConfigError` if `config` fails validation.
    pub fn with_config(config: &CalendarConfig, clock: C) -> Result<Self, ConfigError> {
        Ok(Self::new(Converter::new(config)?, clock))
    }

    pub const fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// The calendar position for the clock's current reading.
    pub fn today(&self) -> CalendarPosition {
        self.converter.convert(self.clock.now())
    }
}
