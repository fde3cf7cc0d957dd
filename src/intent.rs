//! Change requests from request handlers to the tick loop
//!
//! Handlers never touch engine state. They push a [`LightIntent`] into a
//! bounded queue guarded by a critical section; the tick loop drains the
//! queue between ticks and applies every intent as a whole-object
//! replacement of the affected engine state.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;
use log::warn;

use crate::engine::Engine;
use crate::error::Result;
use crate::lights::LightVector;
use crate::storage::ConfigStorage;

/// Requested change of engine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightIntent {
    /// Set the track speed, clamped to the speed limit
    SetSpeed(i32),
    SetSpeedLimit(u8),
    ReverseDirection,
    /// Replace every fixture state at once
    SetLeds(LightVector),
    /// Resize the chain; all fixtures start off
    SetLedCount(usize),
    SetBrightness(u8),
    SetTimeZoneOffset(i8),
}

impl LightIntent {
    /// Validate a bit string and wrap it in a [`LightIntent::SetLeds`]
    ///
    /// Non-binary characters are rejected here, so the sender learns about
    /// them right away. The length is checked when the intent is applied.
    pub fn leds(bits: &str) -> Result<Self> {
        LightVector::parse(bits).map(Self::SetLeds)
    }
}

/// Returned when the queue is full
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFull(pub LightIntent);

/// Bounded intent queue shared between handlers and the tick loop
pub struct IntentQueue<const SIZE: usize> {
    inner: Mutex<RefCell<Deque<LightIntent, SIZE>>>,
}

impl<const SIZE: usize> IntentQueue<SIZE> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Handle for request handlers
    pub const fn sender(&self) -> IntentSender<'_, SIZE> {
        IntentSender { queue: self }
    }

    /// Handle for the tick loop
    pub const fn receiver(&self) -> IntentReceiver<'_, SIZE> {
        IntentReceiver { queue: self }
    }

    fn push(&self, intent: LightIntent) -> core::result::Result<(), QueueFull> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.push_back(intent).map_err(QueueFull)
        })
    }

    fn pop(&self) -> Option<LightIntent> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().pop_front())
    }

    /// Number of queued intents
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const SIZE: usize> Default for IntentQueue<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending half of an [`IntentQueue`]
#[derive(Clone, Copy)]
pub struct IntentSender<'a, const SIZE: usize> {
    queue: &'a IntentQueue<SIZE>,
}

impl<const SIZE: usize> IntentSender<'_, SIZE> {
    /// Queue an intent
    ///
    /// Returns the intent back if the queue is full.
    pub fn try_send(&self, intent: LightIntent) -> core::result::Result<(), QueueFull> {
        self.queue.push(intent)
    }
}

/// Receiving half of an [`IntentQueue`]
#[derive(Clone, Copy)]
pub struct IntentReceiver<'a, const SIZE: usize> {
    queue: &'a IntentQueue<SIZE>,
}

impl<const SIZE: usize> IntentReceiver<'_, SIZE> {
    pub fn try_receive(&self) -> Option<LightIntent> {
        self.queue.pop()
    }
}

/// Summary of one drain of the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentEffects {
    pub applied: usize,
    pub rejected: usize,
    /// An applied intent changed what the chain should show
    pub frame_changed: bool,
}

/// Applies queued intents to an engine
pub struct IntentProcessor<'a, const SIZE: usize> {
    intents: IntentReceiver<'a, SIZE>,
}

impl<'a, const SIZE: usize> IntentProcessor<'a, SIZE> {
    pub const fn new(intents: IntentReceiver<'a, SIZE>) -> Self {
        Self { intents }
    }

    /// Apply all pending intents (non-blocking)
    ///
    /// Rejected intents are logged and dropped; the engine is left as it
    /// was before each of them.
    pub fn process_pending<S: ConfigStorage>(&mut self, engine: &mut Engine<S>) -> IntentEffects {
        let mut effects = IntentEffects::default();

        while let Some(intent) = self.intents.try_receive() {
            match engine.apply(intent) {
                Ok(frame_changed) => {
                    effects.applied += 1;
                    effects.frame_changed |= frame_changed;
                }
                Err(err) => {
                    warn!("[IntentProcessor] rejected intent: {err}");
                    effects.rejected += 1;
                }
            }
        }

        effects
    }
}
