//! Clock readings and time sources
//!
//! The engine only needs an hour and a minute per tick. Where they come
//! from (SNTP, an RTC, an accelerated simulation) is up to the
//! [`TimeSource`] implementation.

use core::fmt;

use crate::error::{Error, Result};

pub const HOURS_PER_DAY: u8 = 24;
pub const MINUTES_PER_HOUR: u8 = 60;
pub const MINUTES_PER_DAY: u16 = HOURS_PER_DAY as u16 * MINUTES_PER_HOUR as u16;

/// Default step of the simulated clock (one tick of the town)
pub const DEFAULT_SIMULATION_STEP_MINUTES: u16 = 10;

/// Time of day with minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct ClockReading {
    hour: u8,
    minute: u8,
}

impl ClockReading {
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Create a reading, rejecting hours above 23 and minutes above 59
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour >= HOURS_PER_DAY || minute >= MINUTES_PER_HOUR {
            return Err(Error::InvalidClock { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    /// Build a reading from minutes since midnight, wrapping past the day end
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_minutes_of_day(minutes: u32) -> Self {
        let minutes = minutes % MINUTES_PER_DAY as u32;
        Self {
            hour: (minutes / MINUTES_PER_HOUR as u32) as u8,
            minute: (minutes % MINUTES_PER_HOUR as u32) as u8,
        }
    }

    pub const fn hour(self) -> u8 {
        self.hour
    }

    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight
    pub const fn minutes_of_day(self) -> u16 {
        self.hour as u16 * MINUTES_PER_HOUR as u16 + self.minute as u16
    }

    /// Move the reading forward, wrapping around midnight
    pub const fn advance(self, minutes: u32) -> Self {
        let minutes = minutes % MINUTES_PER_DAY as u32;
        Self::from_minutes_of_day(self.minutes_of_day() as u32 + minutes)
    }

    /// Shift the reading by a whole-hour time zone offset
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_offset(self, offset_hours: i8) -> Self {
        let hour = (i16::from(self.hour) + i16::from(offset_hours))
            .rem_euclid(i16::from(HOURS_PER_DAY));
        Self {
            hour: hour as u8,
            minute: self.minute,
        }
    }
}

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Source of the current time of day
///
/// Implementations must never block. When a refresh fails the source keeps
/// reporting its last known reading.
pub trait TimeSource {
    /// Current hour (0-23)
    fn hours(&self) -> u8;

    /// Current minute (0-59)
    fn minutes(&self) -> u8;

    /// Try to update the reading
    ///
    /// Returns `false` if the source could not be refreshed.
    fn refresh(&mut self) -> bool;

    /// Current reading as a validated value
    fn reading(&self) -> Result<ClockReading> {
        ClockReading::new(self.hours(), self.minutes())
    }
}

/// Accelerated clock: every refresh moves time forward by a fixed step
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    reading: ClockReading,
    step_minutes: u16,
}

impl SimulatedClock {
    pub const fn new(start: ClockReading, step_minutes: u16) -> Self {
        Self {
            reading: start,
            step_minutes,
        }
    }

    pub const fn step_minutes(&self) -> u16 {
        self.step_minutes
    }

    pub fn set_step_minutes(&mut self, step_minutes: u16) {
        self.step_minutes = step_minutes;
    }

    /// Jump to a specific time of day
    pub fn set(&mut self, reading: ClockReading) {
        self.reading = reading;
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new(ClockReading::MIDNIGHT, DEFAULT_SIMULATION_STEP_MINUTES)
    }
}

impl TimeSource for SimulatedClock {
    fn hours(&self) -> u8 {
        self.reading.hour()
    }

    fn minutes(&self) -> u8 {
        self.reading.minute()
    }

    fn refresh(&mut self) -> bool {
        self.reading = self.reading.advance(u32::from(self.step_minutes));
        true
    }
}

/// Clock that is set from the outside
///
/// Used by glue that receives time through another channel, and by tests
/// that need to simulate a failing synchronization.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    reading: ClockReading,
    synced: bool,
}

impl ManualClock {
    pub const fn new(reading: ClockReading) -> Self {
        Self {
            reading,
            synced: true,
        }
    }

    pub fn set(&mut self, reading: ClockReading) {
        self.reading = reading;
    }

    /// Set whether the next refreshes succeed
    pub fn set_synced(&mut self, synced: bool) {
        self.synced = synced;
    }
}

impl TimeSource for ManualClock {
    fn hours(&self) -> u8 {
        self.reading.hour()
    }

    fn minutes(&self) -> u8 {
        self.reading.minute()
    }

    fn refresh(&mut self) -> bool {
        self.synced
    }
}
