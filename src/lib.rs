#![no_std]

extern crate alloc;

pub mod clock;
pub mod config;
pub mod convergence;
pub mod engine;
pub mod error;
pub mod intent;
pub mod lights;
pub mod packer;
pub mod phase;
pub mod storage;
pub mod tick_scheduler;

pub use clock::{ClockReading, ManualClock, SimulatedClock, TimeSource};
pub use config::{Config, ConfigRecord};
pub use convergence::{Convergence, ConvergenceToggler};
pub use engine::{Direction, Engine, EngineOptions, TickReport};
pub use error::{Error, Result, StorageError};
pub use intent::{
    IntentEffects, IntentProcessor, IntentQueue, IntentReceiver, IntentSender, LightIntent,
    QueueFull,
};
pub use lights::{FixtureLayout, LayoutShares, LightVector};
pub use packer::{BitPacker, Frame, pack, unpack};
pub use phase::{
    Category, CategoryTargets, OnWindow, PerCategory, Phase, PhaseScheduler, target_percent,
};
pub use storage::{ConfigStorage, MemoryStorage};
pub use tick_scheduler::{TickResult, TickScheduler};

pub use embassy_time::{Duration, Instant};

/// Abstract shift-register output trait
///
/// Implement this trait to drive the fixture chain on a given platform.
/// Rendering is fire-and-forget: there is no acknowledgment path.
pub trait HardwareOutput {
    /// Shift a frame into the chain and apply its brightness
    fn render(&mut self, frame: Frame<'_>);
}
