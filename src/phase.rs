//! Time-of-day schedule of target illumination
//!
//! Interpolated categories (houses) follow a table of phases, each ramping
//! linearly from a start to a target percentage. Time-gated categories
//! (commercial buildings, street lights) are either fully on or fully off,
//! depending on whether the hour falls in one of their on windows.
//!
//! Intervals use whole hours. An interval whose end hour is not after its
//! start hour wraps around midnight; equal hours span the whole day.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::clock::{ClockReading, HOURS_PER_DAY, MINUTES_PER_HOUR};
use crate::error::{Error, Result};

/// Fixture category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    House,
    Commercial,
    Street,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::House, Self::Commercial, Self::Street];

    /// Whether the category is switched by on windows instead of phases
    pub const fn is_time_gated(self) -> bool {
        matches!(self, Self::Commercial | Self::Street)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Commercial => "commercial",
            Self::Street => "street",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per fixture category
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerCategory<T> {
    pub house: T,
    pub commercial: T,
    pub street: T,
}

impl<T> PerCategory<T> {
    pub const fn get(&self, category: Category) -> &T {
        match category {
            Category::House => &self.house,
            Category::Commercial => &self.commercial,
            Category::Street => &self.street,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::House => &mut self.house,
            Category::Commercial => &mut self.commercial,
            Category::Street => &mut self.street,
        }
    }

    /// Iterate over `(category, value)` pairs in [`Category::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().map(move |category| (category, self.get(category)))
    }
}

/// Target percentage per category
pub type CategoryTargets = PerCategory<f32>;

/// Length of an hour interval in minutes, with midnight wraparound
fn span_minutes(start_hour: u8, end_hour: u8) -> i32 {
    let start = i32::from(start_hour);
    let end = i32::from(end_hour);
    let hours = if end <= start {
        i32::from(HOURS_PER_DAY) + end - start
    } else {
        end - start
    };
    hours * i32::from(MINUTES_PER_HOUR)
}

fn interval_covers(start_hour: u8, end_hour: u8, hour: u8) -> bool {
    if start_hour < end_hour {
        hour >= start_hour && hour < end_hour
    } else {
        hour >= start_hour || hour < end_hour
    }
}

fn check_hours(start_hour: u8, end_hour: u8) -> Result<u32> {
    let invalid = |reason: &'static str| Error::InvalidPhase {
        start_hour,
        end_hour,
        reason,
    };
    let duration = span_minutes(start_hour, end_hour);
    if duration <= 0 {
        return Err(invalid("duration is not positive"));
    }
    if start_hour >= HOURS_PER_DAY || end_hour >= HOURS_PER_DAY {
        return Err(invalid("hour out of range"));
    }
    duration.try_into().map_err(|_| invalid("duration is not positive"))
}

/// Interpolated interval of one category's schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub start_hour: u8,
    pub end_hour: u8,
    /// Percentage at `start_hour`
    pub start_percent: f32,
    /// Percentage reached at `end_hour`
    pub target_percent: f32,
    pub category: Category,
}

impl Phase {
    pub fn new(
        category: Category,
        start_hour: u8,
        end_hour: u8,
        start_percent: f32,
        target_percent: f32,
    ) -> Result<Self> {
        let phase = Self {
            start_hour,
            end_hour,
            start_percent,
            target_percent,
            category,
        };
        phase.validate()?;
        Ok(phase)
    }

    /// Check hours, duration and percentages
    pub fn validate(&self) -> Result<()> {
        check_hours(self.start_hour, self.end_hour)?;
        let valid_percent = |value: f32| value.is_finite() && (0.0..=100.0).contains(&value);
        if !valid_percent(self.start_percent) || !valid_percent(self.target_percent) {
            return Err(Error::InvalidPhase {
                start_hour: self.start_hour,
                end_hour: self.end_hour,
                reason: "percentage out of range",
            });
        }
        Ok(())
    }

    /// Phase length in minutes
    pub fn duration_minutes(&self) -> Result<u32> {
        check_hours(self.start_hour, self.end_hour)
    }

    /// Whether `hour` falls inside the phase
    pub fn covers(&self, hour: u8) -> bool {
        interval_covers(self.start_hour, self.end_hour, hour)
    }

    /// Interpolated percentage at `reading`
    pub fn percent_at(&self, reading: ClockReading) -> Result<f32> {
        target_percent(self, reading)
    }
}

/// Interpolate a phase at the given time of day
///
/// Elapsed time is measured from the phase start with the same midnight
/// wraparound as the duration, then clamped to the phase length.
#[allow(clippy::cast_precision_loss)]
pub fn target_percent(phase: &Phase, reading: ClockReading) -> Result<f32> {
    phase.validate()?;
    let duration = phase.duration_minutes()?;

    let start = i32::from(phase.start_hour);
    let hour = i32::from(reading.hour());
    let hours_elapsed = if hour >= start {
        hour - start
    } else {
        i32::from(HOURS_PER_DAY) + hour - start
    };
    let elapsed = hours_elapsed * i32::from(MINUTES_PER_HOUR) + i32::from(reading.minute());

    let fraction = (elapsed as f32 / duration as f32).clamp(0.0, 1.0);
    Ok(phase.start_percent + (phase.target_percent - phase.start_percent) * fraction)
}

/// Interval in which a time-gated category is fully on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnWindow {
    pub category: Category,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl OnWindow {
    pub fn new(category: Category, start_hour: u8, end_hour: u8) -> Result<Self> {
        check_hours(start_hour, end_hour)?;
        Ok(Self {
            category,
            start_hour,
            end_hour,
        })
    }

    pub fn covers(&self, hour: u8) -> bool {
        interval_covers(self.start_hour, self.end_hour, hour)
    }
}

/// Computes per-category targets from a phase table and on windows
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseScheduler {
    phases: Vec<Phase>,
    windows: Vec<OnWindow>,
}

impl PhaseScheduler {
    /// Create a validated scheduler
    pub fn new(phases: Vec<Phase>, windows: Vec<OnWindow>) -> Result<Self> {
        let scheduler = Self { phases, windows };
        scheduler.validate()?;
        Ok(scheduler)
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn windows(&self) -> &[OnWindow] {
        &self.windows
    }

    /// Check that every phase and window is well formed and that each hour
    /// is covered by exactly one phase of every interpolated category.
    pub fn validate(&self) -> Result<()> {
        for phase in &self.phases {
            phase.validate()?;
            if phase.category.is_time_gated() {
                return Err(Error::InvalidPhase {
                    start_hour: phase.start_hour,
                    end_hour: phase.end_hour,
                    reason: "category is switched by on windows",
                });
            }
        }

        for window in &self.windows {
            check_hours(window.start_hour, window.end_hour)?;
            if !window.category.is_time_gated() {
                return Err(Error::InvalidPhase {
                    start_hour: window.start_hour,
                    end_hour: window.end_hour,
                    reason: "category is interpolated",
                });
            }
        }

        for category in Category::ALL.into_iter().filter(|c| !c.is_time_gated()) {
            for hour in 0..HOURS_PER_DAY {
                let covering = self
                    .phases
                    .iter()
                    .filter(|phase| phase.category == category && phase.covers(hour))
                    .count();
                match covering {
                    0 => return Err(Error::UncoveredHour { category, hour }),
                    1 => {}
                    _ => return Err(Error::OverlappingPhases { category, hour }),
                }
            }
        }

        Ok(())
    }

    /// Phase of `category` that covers `hour`
    pub fn phase_for(&self, category: Category, hour: u8) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|phase| phase.category == category && phase.covers(hour))
    }

    /// Target percentage of one category at `reading`
    pub fn target_for(&self, category: Category, reading: ClockReading) -> Result<f32> {
        let hour = reading.hour();
        if category.is_time_gated() {
            let on = self
                .windows
                .iter()
                .any(|window| window.category == category && window.covers(hour));
            return Ok(if on { 100.0 } else { 0.0 });
        }

        let phase = self
            .phase_for(category, hour)
            .ok_or(Error::UncoveredHour { category, hour })?;
        target_percent(phase, reading)
    }

    /// Target percentages of all categories at `reading`
    pub fn targets(&self, reading: ClockReading) -> Result<CategoryTargets> {
        Ok(CategoryTargets {
            house: self.target_for(Category::House, reading)?,
            commercial: self.target_for(Category::Commercial, reading)?,
            street: self.target_for(Category::Street, reading)?,
        })
    }
}

impl Default for PhaseScheduler {
    /// The town's day: houses light up through the evening and go dark
    /// overnight, shops open from 8 to 20, street lights burn from 19 to 7.
    fn default() -> Self {
        let house = |start_hour, end_hour, start_percent, target_percent| Phase {
            start_hour,
            end_hour,
            start_percent,
            target_percent,
            category: Category::House,
        };
        Self {
            phases: vec![
                house(6, 8, 5.0, 60.0),
                house(8, 17, 60.0, 10.0),
                house(17, 22, 10.0, 80.0),
                house(22, 6, 80.0, 5.0),
            ],
            windows: vec![
                OnWindow {
                    category: Category::Commercial,
                    start_hour: 8,
                    end_hour: 20,
                },
                OnWindow {
                    category: Category::Street,
                    start_hour: 19,
                    end_hour: 7,
                },
            ],
        }
    }
}
