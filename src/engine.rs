use alloc::format;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::clock::ClockReading;
use crate::config::{Config, MAX_LED_COUNT, TIME_ZONE_OFFSET_RANGE};
use crate::convergence::{Convergence, ConvergenceToggler};
use crate::error::{Error, Result};
use crate::intent::LightIntent;
use crate::lights::{FixtureLayout, LayoutShares, LightVector};
use crate::packer::{BitPacker, Frame, unpack};
use crate::phase::{Category, CategoryTargets, PerCategory, PhaseScheduler};
use crate::storage::ConfigStorage;

/// Default seed of the engine's random source
pub const DEFAULT_SEED: u64 = 0x0C17_11A6;

/// Running direction of the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// Options of the engine that are not persisted
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Seed of the random source used for convergence
    pub seed: u64,
    /// How the chain is split into categories
    pub shares: LayoutShares,
    pub toggler: ConvergenceToggler,
    pub scheduler: PhaseScheduler,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            shares: LayoutShares::default(),
            toggler: ConvergenceToggler::default(),
            scheduler: PhaseScheduler::default(),
        }
    }
}

/// Result of one simulation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Local time the tick was evaluated at
    pub reading: ClockReading,
    pub targets: CategoryTargets,
    pub changes: PerCategory<Convergence>,
}

/// Lighting engine - owns all simulation state
///
/// Every mutation goes through the methods below. Each of them either
/// replaces the affected value as a whole or leaves it untouched on error.
pub struct Engine<S: ConfigStorage> {
    // External dependencies and configuration
    storage: S,
    config: Config,
    shares: LayoutShares,

    // Internal state
    lights: LightVector,
    layout: FixtureLayout,
    custom_layout: bool,
    speed: u8,
    direction: Direction,

    // Internal dependencies
    scheduler: PhaseScheduler,
    toggler: ConvergenceToggler,
    packer: BitPacker,
    rng: SmallRng,
}

impl<S: ConfigStorage> Engine<S> {
    /// Load the config from `storage` and start with every fixture off
    pub fn boot(mut storage: S, options: EngineOptions) -> Result<Self> {
        let config = Config::load(&mut storage);
        Self::new(storage, config, options)
    }

    /// Create an engine with an explicit config
    pub fn new(storage: S, config: Config, options: EngineOptions) -> Result<Self> {
        options.scheduler.validate()?;
        check_led_count(config.led_count)?;

        info!(
            "[Engine] starting with {} fixtures, brightness {}",
            config.led_count, config.led_brightness
        );
        Ok(Self {
            storage,
            config,
            shares: options.shares,
            lights: LightVector::zeroed(config.led_count),
            layout: FixtureLayout::proportional(config.led_count, options.shares),
            custom_layout: false,
            speed: 0,
            direction: Direction::default(),
            scheduler: options.scheduler,
            toggler: options.toggler,
            packer: BitPacker::new(),
            rng: SmallRng::seed_from_u64(options.seed),
        })
    }

    /// Restore fixture states from the last frame sent to the chain
    pub fn restore(&mut self, frame: &[u8]) -> Result<()> {
        self.lights = unpack(frame, self.config.led_count)?;
        Ok(())
    }

    /// Use an explicit category layout instead of the proportional one
    ///
    /// The layout only lives as long as the fixture count: a later
    /// [`set_led_count`](Self::set_led_count) goes back to the proportional
    /// layout.
    pub fn set_layout(&mut self, layout: FixtureLayout) -> Result<()> {
        if layout.len() != self.lights.len() {
            return Err(Error::InvalidLayout(format!(
                "layout covers {} fixtures, chain has {}",
                layout.len(),
                self.lights.len()
            )));
        }
        self.layout = layout;
        self.custom_layout = true;
        Ok(())
    }

    /// Run one simulation step at local time `reading`
    ///
    /// Converges every category toward its scheduled target. The new
    /// fixture states replace the old ones only if all categories succeed.
    pub fn tick(&mut self, reading: ClockReading) -> Result<TickReport> {
        let targets = self.scheduler.targets(reading)?;

        let mut lights = self.lights.clone();
        let mut changes = PerCategory::<Convergence>::default();
        for category in Category::ALL {
            *changes.get_mut(category) = self.toggler.converge(
                &mut lights,
                self.layout.indices(category),
                *targets.get(category),
                &mut self.rng,
            )?;
        }
        self.lights = lights;

        debug!(
            "[Engine.tick] {reading}: house {:.1}% -> {}/{}, commercial {:.0}% -> {}/{}, street {:.0}% -> {}/{}",
            targets.house,
            changes.house.on_count,
            changes.house.total,
            targets.commercial,
            changes.commercial.on_count,
            changes.commercial.total,
            targets.street,
            changes.street.on_count,
            changes.street.total,
        );

        Ok(TickReport {
            reading,
            targets,
            changes,
        })
    }

    /// Pack the current fixture states into a frame
    pub fn frame(&mut self) -> Frame<'_> {
        Frame {
            bytes: self.packer.pack(&self.lights),
            brightness: self.config.led_brightness,
        }
    }

    /// Apply a queued intent
    ///
    /// Returns whether the frame content changed.
    pub fn apply(&mut self, intent: LightIntent) -> Result<bool> {
        match intent {
            LightIntent::SetSpeed(speed) => {
                self.set_speed(speed);
                Ok(false)
            }
            LightIntent::SetSpeedLimit(limit) => {
                self.set_speed_limit(limit);
                Ok(false)
            }
            LightIntent::ReverseDirection => {
                self.reverse_direction();
                Ok(false)
            }
            LightIntent::SetLeds(lights) => self.set_light_vector(lights).map(|()| true),
            LightIntent::SetLedCount(count) => self.set_led_count(count),
            LightIntent::SetBrightness(brightness) => Ok(self.set_brightness(brightness)),
            LightIntent::SetTimeZoneOffset(offset) => {
                self.set_time_zone_offset(offset)?;
                Ok(false)
            }
        }
    }

    /// Set the track speed, clamped to `0..=speed_limit`
    ///
    /// Returns the speed in effect.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_speed(&mut self, speed: i32) -> u8 {
        let limit = self.config.speed_limit;
        let clamped = speed.clamp(0, i32::from(limit)) as u8;
        if speed > i32::from(limit) {
            warn!("[Engine.set_speed] {speed} exceeds the limit of {limit}");
        }
        self.speed = clamped;
        info!("[Engine.set_speed] speed set to {clamped}");
        clamped
    }

    /// Change the speed limit, lowering the current speed if needed
    pub fn set_speed_limit(&mut self, limit: u8) {
        self.replace_config(Config {
            speed_limit: limit,
            ..self.config
        });
        self.speed = self.speed.min(limit);
    }

    pub fn reverse_direction(&mut self) -> Direction {
        self.direction = self.direction.reversed();
        info!("[Engine.reverse_direction] now {:?}", self.direction);
        self.direction
    }

    /// Replace every fixture state from a `'0'`/`'1'` string
    ///
    /// The string must have exactly one character per fixture.
    pub fn set_leds(&mut self, bits: &str) -> Result<()> {
        self.set_light_vector(LightVector::parse(bits)?)
    }

    /// Replace every fixture state
    pub fn set_light_vector(&mut self, lights: LightVector) -> Result<()> {
        if lights.len() != self.config.led_count {
            return Err(Error::InvalidInput(format!(
                "expected {} fixture states, got {}",
                self.config.led_count,
                lights.len()
            )));
        }
        self.lights = lights;
        Ok(())
    }

    /// Resize the chain
    ///
    /// A new count starts from a zero-filled vector and a fresh layout; the
    /// previous frame buffer is discarded. Returns whether anything changed.
    pub fn set_led_count(&mut self, count: usize) -> Result<bool> {
        check_led_count(count)?;
        if count == self.config.led_count {
            return Ok(false);
        }

        if self.custom_layout {
            warn!(
                "[Engine.set_led_count] custom layout of {} fixtures replaced by the proportional one",
                self.layout.len()
            );
        }
        self.lights = LightVector::zeroed(count);
        self.layout = FixtureLayout::proportional(count, self.shares);
        self.custom_layout = false;
        self.packer.reset();
        self.replace_config(Config {
            led_count: count,
            ..self.config
        });
        Ok(true)
    }

    /// Set the global brightness, returning whether it changed
    pub fn set_brightness(&mut self, brightness: u8) -> bool {
        if brightness == self.config.led_brightness {
            return false;
        }
        self.replace_config(Config {
            led_brightness: brightness,
            ..self.config
        });
        true
    }

    pub fn set_time_zone_offset(&mut self, offset: i8) -> Result<()> {
        if !TIME_ZONE_OFFSET_RANGE.contains(&offset) {
            return Err(Error::InvalidInput(format!(
                "time zone offset {offset} is outside {TIME_ZONE_OFFSET_RANGE:?}"
            )));
        }
        self.replace_config(Config {
            time_zone_offset: offset,
            ..self.config
        });
        Ok(())
    }

    /// Swap in a new config and persist it
    ///
    /// A failed write keeps the new config in memory.
    fn replace_config(&mut self, config: Config) {
        self.config = config;
        info!("[Engine] config changed to {config:?}");
        if let Err(err) = config.save(&mut self.storage) {
            warn!("[Engine] failed to persist config: {err}");
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn lights(&self) -> &LightVector {
        &self.lights
    }

    pub const fn layout(&self) -> &FixtureLayout {
        &self.layout
    }

    /// Whether the layout was installed with [`set_layout`](Self::set_layout)
    pub const fn has_custom_layout(&self) -> bool {
        self.custom_layout
    }

    pub const fn scheduler(&self) -> &PhaseScheduler {
        &self.scheduler
    }

    pub const fn speed(&self) -> u8 {
        self.speed
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Frame buffer state, for inspecting reallocation
    pub const fn packer(&self) -> &BitPacker {
        &self.packer
    }
}

fn check_led_count(count: usize) -> Result<()> {
    if count == 0 || count > MAX_LED_COUNT {
        return Err(Error::InvalidInput(format!(
            "fixture count {count} is outside 1..={MAX_LED_COUNT}"
        )));
    }
    Ok(())
}
