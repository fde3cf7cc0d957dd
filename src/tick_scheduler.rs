//! Tick scheduling and timing utilities.
//!
//! Provides portable tick pacing without async/await or platform-specific timers.
//! The caller is responsible for sleeping/waiting between ticks.

use embassy_time::{Duration, Instant};
use log::{error, warn};

use crate::clock::{ClockReading, TimeSource};
use crate::engine::{Engine, TickReport};
use crate::intent::{IntentEffects, IntentProcessor, IntentReceiver};
use crate::storage::ConfigStorage;
use crate::HardwareOutput;

/// Default interval between simulation ticks (10 minutes).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Result of a tick.
#[derive(Debug, Clone, Copy)]
pub struct TickResult {
    /// The deadline for the next tick.
    pub next_deadline: Instant,
    /// How long to wait until the next tick (may be zero if behind schedule).
    pub sleep_duration: Duration,
    /// What the tick did, `None` if the targets could not be resolved.
    pub report: Option<TickReport>,
}

/// Portable tick scheduler that drives the engine without async.
///
/// This scheduler:
/// - Applies queued intents and renders right away when they change the frame
/// - Refreshes the time source, keeping the last reading when that fails
/// - Runs the engine and renders the resulting frame
/// - Returns timing info so the caller can sleep appropriately
///
/// # Usage
///
/// ```ignore
/// let mut scheduler = TickScheduler::new(engine, clock, output, INTENTS.receiver());
///
/// loop {
///     let now = get_current_time_ms();
///     let result = scheduler.tick(Instant::from_millis(now));
///
///     // Handle requests while waiting for the next tick
///     scheduler.process_intents();
///     sleep_ms(result.sleep_duration.as_millis());
/// }
/// ```
pub struct TickScheduler<'a, T, O, S, const INTENT_CHANNEL_SIZE: usize>
where
    T: TimeSource,
    O: HardwareOutput,
    S: ConfigStorage,
{
    clock: T,
    output: O,
    engine: Engine<S>,
    intents: IntentProcessor<'a, INTENT_CHANNEL_SIZE>,
    last_reading: ClockReading,
    next_tick: Instant,
    tick_interval: Duration,
}

impl<'a, T, O, S, const INTENT_CHANNEL_SIZE: usize> TickScheduler<'a, T, O, S, INTENT_CHANNEL_SIZE>
where
    T: TimeSource,
    O: HardwareOutput,
    S: ConfigStorage,
{
    /// Create a new tick scheduler.
    ///
    /// Uses `DEFAULT_TICK_INTERVAL` (10 minutes) for tick timing.
    pub fn new(
        engine: Engine<S>,
        clock: T,
        output: O,
        intents: IntentReceiver<'a, INTENT_CHANNEL_SIZE>,
    ) -> Self {
        Self::with_tick_interval(engine, clock, output, intents, DEFAULT_TICK_INTERVAL)
    }

    /// Create a new tick scheduler with custom tick interval.
    pub fn with_tick_interval(
        engine: Engine<S>,
        clock: T,
        output: O,
        intents: IntentReceiver<'a, INTENT_CHANNEL_SIZE>,
        tick_interval: Duration,
    ) -> Self {
        let last_reading = clock.reading().unwrap_or_default();
        Self {
            clock,
            output,
            engine,
            intents: IntentProcessor::new(intents),
            last_reading,
            next_tick: Instant::from_millis(0),
            tick_interval,
        }
    }

    /// Run one tick and return timing information.
    ///
    /// This method:
    /// 1. Applies drift correction if we've fallen too far behind
    /// 2. Applies pending intents
    /// 3. Refreshes the clock and runs the engine at local time
    /// 4. Renders the frame
    /// 5. Returns the deadline for the next tick
    pub fn tick(&mut self, now: Instant) -> TickResult {
        // Drift correction: if we've fallen too far behind, reset to now
        // This prevents catch-up bursts after long stalls
        let max_drift = self.tick_interval.as_millis() * 2;
        if now.as_millis() > self.next_tick.as_millis() + max_drift {
            self.next_tick = now;
        }

        self.process_intents();

        let reading = self.refresh_clock();
        let local = reading.with_offset(self.engine.config().time_zone_offset);
        let report = match self.engine.tick(local) {
            Ok(report) => {
                self.render();
                Some(report)
            }
            Err(err) => {
                error!("[TickScheduler.tick] tick at {local} failed: {err}");
                None
            }
        };

        self.next_tick += self.tick_interval;

        // May be zero if we're behind
        let sleep_duration = if self.next_tick.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_tick.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        };

        TickResult {
            next_deadline: self.next_tick,
            sleep_duration,
            report,
        }
    }

    /// Apply pending intents, rendering if the frame changed.
    pub fn process_intents(&mut self) -> IntentEffects {
        let effects = self.intents.process_pending(&mut self.engine);
        if effects.frame_changed {
            self.render();
        }
        effects
    }

    /// Send the current frame to the output.
    pub fn render(&mut self) {
        let frame = self.engine.frame();
        self.output.render(frame);
    }

    /// Refresh the clock, falling back to the last reading
    fn refresh_clock(&mut self) -> ClockReading {
        if !self.clock.refresh() {
            warn!(
                "[TickScheduler] time sync failed, keeping {}",
                self.last_reading
            );
            return self.last_reading;
        }
        match self.clock.reading() {
            Ok(reading) => {
                self.last_reading = reading;
                reading
            }
            Err(err) => {
                warn!("[TickScheduler] {err}, keeping {}", self.last_reading);
                self.last_reading
            }
        }
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    /// Get a mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut Engine<S> {
        &mut self.engine
    }

    pub fn clock_mut(&mut self) -> &mut T {
        &mut self.clock
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Reading the last tick was based on (before the time zone offset).
    pub const fn last_reading(&self) -> ClockReading {
        self.last_reading
    }
}
