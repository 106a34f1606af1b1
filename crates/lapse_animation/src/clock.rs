//! Frame clock binding
//!
//! Tweens never own a timer. They register one per-frame callback with a
//! [`FrameClock`] while playing and remove it as soon as they stop.
//!
//! [`Ticker`] is the in-crate clock: a single-threaded callback list driven
//! either by explicit elapsed times (`advance`) or by wall-clock time
//! (`tick`). Hosts with their own frame loop can implement [`FrameClock`]
//! instead.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

new_key_type! {
    /// Handle to a registered per-frame callback
    pub struct TickCallbackId;
}

/// Per-frame callback, receives the milliseconds elapsed since the previous frame
pub type TickCallback = Box<dyn FnMut(f64)>;

/// The contract a frame clock offers to tweens
pub trait FrameClock {
    /// Start emitting frames
    fn start(&self);

    /// Register a callback invoked once per frame
    fn add(&self, callback: TickCallback) -> TickCallbackId;

    /// Deregister a callback. Unknown ids are ignored.
    fn remove(&self, id: TickCallbackId);

    /// Milliseconds between the previous frame and the current one
    ///
    /// Updated once per frame, before any callback runs.
    fn elapsed_ms(&self) -> f64;
}

/// Ticker tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    /// Multiplier applied to every elapsed time (1.0 = real time)
    pub speed: f64,
    /// Upper bound for a single frame's elapsed time, after `speed`
    pub max_elapsed_ms: Option<f64>,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            max_elapsed_ms: None,
        }
    }
}

impl TickerConfig {
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_max_elapsed_ms(mut self, max_elapsed_ms: f64) -> Self {
        self.max_elapsed_ms = Some(max_elapsed_ms);
        self
    }

    fn scale(&self, elapsed_ms: f64) -> f64 {
        let scaled = elapsed_ms.max(0.0) * self.speed.max(0.0);
        match self.max_elapsed_ms {
            Some(max) => scaled.min(max),
            None => scaled,
        }
    }
}

type Listener = Rc<RefCell<TickCallback>>;

struct TickerInner {
    listeners: SlotMap<TickCallbackId, Listener>,
    /// Registration order, dispatch follows it
    order: Vec<TickCallbackId>,
    started: bool,
    elapsed_ms: f64,
    last_frame: Option<Instant>,
    config: TickerConfig,
}

/// Single-threaded frame clock
///
/// Callbacks run in registration order. A callback added during a frame first
/// runs on the next frame; a callback removed during a frame does not run for
/// the rest of it. Frames are ignored until [`FrameClock::start`] is called.
///
/// ```
/// use lapse_animation::{FrameClock, Ticker};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let ticker = Ticker::new();
/// ticker.start();
///
/// let total = Rc::new(Cell::new(0.0));
/// let sink = total.clone();
/// ticker.add(Box::new(move |elapsed| sink.set(sink.get() + elapsed)));
///
/// ticker.advance(16.0);
/// ticker.advance(16.0);
/// assert_eq!(total.get(), 32.0);
/// ```
pub struct Ticker {
    inner: RefCell<TickerInner>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::with_config(TickerConfig::default())
    }

    pub fn with_config(config: TickerConfig) -> Self {
        Self {
            inner: RefCell::new(TickerInner {
                listeners: SlotMap::with_key(),
                order: Vec::new(),
                started: false,
                elapsed_ms: 0.0,
                last_frame: None,
                config,
            }),
        }
    }

    pub fn config(&self) -> TickerConfig {
        self.inner.borrow().config.clone()
    }

    /// Replace the tuning; applies from the next frame
    pub fn set_config(&self, config: TickerConfig) {
        self.inner.borrow_mut().config = config;
    }

    /// Stop emitting frames. Registered callbacks are kept.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.started = false;
        inner.last_frame = None;
    }

    pub fn is_started(&self) -> bool {
        self.inner.borrow().started
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().listeners.is_empty()
    }

    pub fn contains(&self, id: TickCallbackId) -> bool {
        self.inner.borrow().listeners.contains_key(id)
    }

    /// Drop every registered callback
    ///
    /// Callbacks own their tweens, and tweens own the clock, so a clock that
    /// goes away with callbacks still registered must be cleared to be freed.
    pub fn clear(&self) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner.order.clear();
            std::mem::take(&mut inner.listeners)
        };
        tracing::debug!(callbacks = removed.len(), "Ticker cleared");
        drop(removed);
    }

    /// Emit one frame with an explicit elapsed time
    ///
    /// Returns true if callbacks are still registered after the frame.
    pub fn advance(&self, elapsed_ms: f64) -> bool {
        let (elapsed, frame) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.started {
                tracing::trace!("Ticker: frame ignored, ticker not started");
                return !inner.listeners.is_empty();
            }
            inner.elapsed_ms = inner.config.scale(elapsed_ms);
            (inner.elapsed_ms, inner.order.clone())
        };

        for id in frame {
            let listener = self.inner.borrow().listeners.get(id).cloned();
            let Some(listener) = listener else {
                continue;
            };
            // A nested advance() from inside this callback must not re-enter it
            let Ok(mut callback) = listener.try_borrow_mut() else {
                tracing::warn!("Ticker: skipping re-entrant frame callback");
                continue;
            };
            (*callback)(elapsed);
        }

        !self.is_empty()
    }

    /// Emit one frame using the wall-clock time since the previous `tick`
    ///
    /// The first tick measures from the moment the ticker was started.
    pub fn tick(&self) -> bool {
        let now = Instant::now();
        let elapsed_ms = {
            let mut inner = self.inner.borrow_mut();
            let elapsed = inner
                .last_frame
                .map(|last| (now - last).as_secs_f64() * 1000.0)
                .unwrap_or(0.0);
            inner.last_frame = Some(now);
            elapsed
        };
        self.advance(elapsed_ms)
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for Ticker {
    fn start(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.started {
            return;
        }
        inner.started = true;
        inner.last_frame = Some(Instant::now());
        tracing::debug!("Ticker started");
    }

    fn add(&self, callback: TickCallback) -> TickCallbackId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.listeners.insert(Rc::new(RefCell::new(callback)));
        inner.order.push(id);
        id
    }

    fn remove(&self, id: TickCallbackId) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner.order.retain(|registered| *registered != id);
            inner.listeners.remove(id)
        };
        // Dropping the callback may drop the last handle to a tween; do it unborrowed
        drop(removed);
    }

    fn elapsed_ms(&self) -> f64 {
        self.inner.borrow().elapsed_ms
    }
}
