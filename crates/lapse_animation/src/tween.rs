//! Tweens
//!
//! A [`Tween`] interpolates numeric properties of a target from the values
//! they had when the tween was configured to the requested end values, over a
//! duration, following an ease.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --play--> Playing --progress reaches 1--> Finished
//!                  |  ^                              |
//!                stop resume                  play / resume
//!                  v  |                              |
//!                 Paused <---------------------------+
//! ```
//!
//! While playing, the tween holds one callback registration on the context's
//! frame clock. Each frame it advances progress by `elapsed / duration`,
//! computes `ratio = ease(progress)`, writes
//! `initial + (end - initial) * ratio` to every property, then runs
//! `on_update`, and on the last frame `on_complete`.
//!
//! # Example
//!
//! ```
//! use lapse_animation::{AnimationContext, FrameClock, Ticker, Tween, TweenParams};
//! use std::cell::RefCell;
//! use std::collections::HashMap;
//! use std::rc::Rc;
//!
//! let ticker = Rc::new(Ticker::new());
//! ticker.start();
//! let ctx = AnimationContext::new(ticker.clone());
//!
//! let sprite = Rc::new(RefCell::new(HashMap::from([("x".to_string(), 0.0)])));
//! let tween = Tween::new(
//!     &ctx,
//!     TweenParams::new().duration(1000.0).target(&sprite).property("x", 100.0),
//! )
//! .unwrap();
//!
//! tween.play(0.0);
//! ticker.advance(500.0);
//! assert_eq!(sprite.borrow()["x"], 50.0);
//! ```

use crate::clock::TickCallbackId;
use crate::context::AnimationContext;
use crate::easing::EaseFn;
use crate::error::{ConfigError, Result};
use crate::group::GroupSymbol;
use crate::params::{Target, TweenCallback, TweenParams};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Start value and total change of one animated property
#[derive(Clone, Copy, Debug, PartialEq)]
struct PropertySnapshot {
    initial: f64,
    delta: f64,
}

struct TweenState {
    target: Option<Target>,
    properties: IndexMap<String, PropertySnapshot>,
    duration: f64,
    ease: EaseFn,
    progress: f64,
    ratio: f64,
    playing: bool,
    finished: bool,
}

impl TweenState {
    fn write_target(&self) {
        if self.properties.is_empty() {
            return;
        }
        let Some(target) = self.target.as_ref().and_then(Weak::upgrade) else {
            tracing::trace!("Tween: target dropped, nothing to write");
            return;
        };
        let Ok(mut target) = target.try_borrow_mut() else {
            tracing::warn!("Tween: target is borrowed elsewhere, skipping write");
            return;
        };
        for (name, snapshot) in &self.properties {
            target.set_property(name, snapshot.initial + snapshot.delta * self.ratio);
        }
    }
}

/// Validated configuration, ready to be installed on a tween
struct Prepared {
    duration: f64,
    ease: EaseFn,
    properties: IndexMap<String, PropertySnapshot>,
}

fn prepare(ctx: &AnimationContext, params: &TweenParams) -> Result<Prepared> {
    let duration = params.duration.ok_or(ConfigError::MissingDuration)?;
    if !(duration.is_finite() && duration > 0.0) {
        return Err(ConfigError::InvalidDuration(duration));
    }

    let ease = ctx.eases().resolve(params.ease.as_ref())?;

    let mut properties = IndexMap::with_capacity(params.properties.len());
    if !params.properties.is_empty() {
        let target = params
            .target
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(ConfigError::MissingTarget(params.properties.len()))?;
        let target = target.borrow();
        for (name, end) in &params.properties {
            let initial = target
                .property(name)
                .ok_or_else(|| ConfigError::UnknownProperty(name.clone()))?;
            properties.insert(
                name.clone(),
                PropertySnapshot {
                    initial,
                    delta: end - initial,
                },
            );
        }
    }

    Ok(Prepared {
        duration,
        ease,
        properties,
    })
}

#[derive(Clone, Copy)]
enum Hook {
    Update,
    Complete,
}

#[derive(Default)]
struct Callbacks {
    on_update: Option<TweenCallback>,
    on_complete: Option<TweenCallback>,
    /// Bumped by every reset so a callback running across a reset is not restored
    generation: u64,
}

impl Callbacks {
    fn slot(&mut self, hook: Hook) -> &mut Option<TweenCallback> {
        match hook {
            Hook::Update => &mut self.on_update,
            Hook::Complete => &mut self.on_complete,
        }
    }
}

pub(crate) struct TweenInner {
    ctx: AnimationContext,
    state: RefCell<TweenState>,
    callbacks: RefCell<Callbacks>,
    tick_id: Cell<Option<TickCallbackId>>,
    groups: RefCell<SmallVec<[GroupSymbol; 1]>>,
}

impl Drop for TweenInner {
    fn drop(&mut self) {
        let symbols = std::mem::take(self.groups.get_mut());
        for symbol in &symbols {
            self.ctx.groups().prune(symbol);
        }
    }
}

/// Handle to a tween
///
/// Clones are handles to the same tween; equality is identity. A playing
/// tween is kept alive by its clock registration, so fire-and-forget tweens
/// run to completion even when every handle is dropped.
#[derive(Clone)]
pub struct Tween {
    inner: Rc<TweenInner>,
}

impl Tween {
    /// Build an idle tween
    ///
    /// Fails without touching the clock if the duration is missing or not
    /// positive, the ease name is unknown, or properties are given without a
    /// live target that has them.
    pub fn new(ctx: &AnimationContext, params: TweenParams) -> Result<Self> {
        let prepared = prepare(ctx, &params)?;
        let TweenParams {
            target,
            on_update,
            on_complete,
            groups,
            ..
        } = params;

        let tween = Self {
            inner: Rc::new(TweenInner {
                ctx: ctx.clone(),
                state: RefCell::new(TweenState {
                    target,
                    properties: prepared.properties,
                    duration: prepared.duration,
                    ease: prepared.ease,
                    progress: 0.0,
                    ratio: 0.0,
                    playing: false,
                    finished: false,
                }),
                callbacks: RefCell::new(Callbacks {
                    on_update,
                    on_complete,
                    generation: 0,
                }),
                tick_id: Cell::new(None),
                groups: RefCell::new(SmallVec::new()),
            }),
        };
        for symbol in groups {
            ctx.groups().add_to(symbol, &tween);
        }

        tracing::debug!(
            duration_ms = prepared.duration,
            properties = tween.inner.state.borrow().properties.len(),
            "Tween created"
        );
        Ok(tween)
    }

    /// Reconfigure the tween with new parameters
    ///
    /// The parameters are validated first; on error the tween is untouched.
    /// Otherwise the tween stops, discards its snapshot, progress and
    /// callbacks, takes a fresh snapshot of the target and moves to the groups
    /// named by `params`. It does not start playing.
    pub fn reset(&self, params: TweenParams) -> Result<()> {
        let prepared = prepare(&self.inner.ctx, &params)?;
        let TweenParams {
            target,
            on_update,
            on_complete,
            groups,
            ..
        } = params;

        self.stop();
        *self.inner.state.borrow_mut() = TweenState {
            target,
            properties: prepared.properties,
            duration: prepared.duration,
            ease: prepared.ease,
            progress: 0.0,
            ratio: 0.0,
            playing: false,
            finished: false,
        };
        {
            let mut callbacks = self.inner.callbacks.borrow_mut();
            callbacks.on_update = on_update;
            callbacks.on_complete = on_complete;
            callbacks.generation += 1;
        }

        self.leave_groups();
        for symbol in groups {
            self.inner.ctx.groups().add_to(symbol, self);
        }
        tracing::debug!(duration_ms = prepared.duration, "Tween reset");
        Ok(())
    }

    /// Start playing from progress `from` (0.0 plays from the beginning)
    ///
    /// No-op while already playing. The state at `from` is written to the
    /// target immediately, without running callbacks; frames then advance
    /// from there.
    pub fn play(&self, from: f64) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.playing {
                return;
            }
            state.finished = false;
        }

        self.apply(from);

        self.inner.state.borrow_mut().playing = true;
        let tween = self.clone();
        let id = self
            .inner
            .ctx
            .clock()
            .add(Box::new(move |elapsed_ms| tween.tick(elapsed_ms)));
        self.inner.tick_id.set(Some(id));
        tracing::trace!(from, "Tween playing");
    }

    /// Continue from where `stop` left off
    pub fn resume(&self) {
        self.play(self.progress());
    }

    /// Pause: leave the clock but keep progress
    pub fn stop(&self) {
        if let Some(id) = self.inner.tick_id.take() {
            self.inner.ctx.clock().remove(id);
        }
        self.inner.state.borrow_mut().playing = false;
    }

    /// Stop and leave every group
    pub fn destroy(&self) {
        self.stop();
        self.leave_groups();
        tracing::trace!("Tween destroyed");
    }

    /// Move the tween to `progress` and write the matching values
    ///
    /// `progress` is clamped to `[0, 1]`. While playing this runs `on_update`,
    /// and when `progress` reaches 1 it finishes the tween: it stops, runs
    /// `on_complete` once and leaves its groups.
    pub fn apply(&self, progress: f64) {
        let (playing, reached_end) = {
            let mut state = self.inner.state.borrow_mut();
            let progress = if progress.is_nan() {
                0.0
            } else {
                progress.clamp(0.0, 1.0)
            };
            state.progress = progress;
            state.ratio = (state.ease)(progress);
            state.write_target();
            (state.playing, progress >= 1.0)
        };
        if !playing {
            return;
        }

        let generation = self.generation();
        self.notify(Hook::Update);
        // Stopping inside on_update only cancels later frames; a reset or a
        // replay from an earlier position cancels completion
        if !reached_end || self.generation() != generation || self.progress() < 1.0 {
            return;
        }

        self.inner.state.borrow_mut().finished = true;
        self.stop();
        self.notify(Hook::Complete);

        // on_complete may have restarted or reconfigured the tween
        if !self.is_playing() && self.generation() == generation {
            self.leave_groups();
        }
        tracing::trace!("Tween finished");
    }

    fn tick(&self, elapsed_ms: f64) {
        let next = {
            let state = self.inner.state.borrow();
            if !state.playing {
                return;
            }
            state.progress + elapsed_ms / state.duration
        };
        self.apply(next);
    }

    fn notify(&self, hook: Hook) {
        let (callback, generation) = {
            let mut callbacks = self.inner.callbacks.borrow_mut();
            let generation = callbacks.generation;
            (callbacks.slot(hook).take(), generation)
        };
        let Some(mut callback) = callback else {
            return;
        };

        callback(self);

        let mut callbacks = self.inner.callbacks.borrow_mut();
        if callbacks.generation == generation {
            let slot = callbacks.slot(hook);
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
    }

    fn generation(&self) -> u64 {
        self.inner.callbacks.borrow().generation
    }

    fn leave_groups(&self) {
        let symbols = std::mem::take(&mut *self.inner.groups.borrow_mut());
        for symbol in &symbols {
            self.inner.ctx.groups().remove_from(symbol, self);
        }
    }

    pub(crate) fn remember_group(&self, symbol: GroupSymbol) {
        self.inner.groups.borrow_mut().push(symbol);
    }

    pub(crate) fn forget_group(&self, symbol: &GroupSymbol) {
        let mut groups = self.inner.groups.borrow_mut();
        if let Some(index) = groups.iter().position(|s| s == symbol) {
            groups.remove(index);
        }
    }

    pub(crate) fn downgrade(&self) -> WeakTween {
        WeakTween(Rc::downgrade(&self.inner))
    }

    /// Eased progress; may leave `[0, 1]` for overshooting eases
    pub fn ratio(&self) -> f64 {
        self.inner.state.borrow().ratio
    }

    /// Elapsed fraction of the duration, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        self.inner.state.borrow().progress
    }

    pub fn duration_ms(&self) -> f64 {
        self.inner.state.borrow().duration
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state.borrow().playing
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.borrow().finished
    }

    /// Symbols of the groups this tween belongs to
    pub fn groups(&self) -> Vec<GroupSymbol> {
        self.inner.groups.borrow().to_vec()
    }

    /// Start value captured for `property`
    pub fn initial_value(&self, property: &str) -> Option<f64> {
        self.inner
            .state
            .borrow()
            .properties
            .get(property)
            .map(|s| s.initial)
    }

    /// Total change (`end - initial`) for `property`
    pub fn delta_value(&self, property: &str) -> Option<f64> {
        self.inner
            .state
            .borrow()
            .properties
            .get(property)
            .map(|s| s.delta)
    }

    pub fn ptr_eq(&self, other: &Tween) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Tween {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Tween")
            .field("duration_ms", &state.duration)
            .field("properties", &state.properties.keys().collect::<Vec<_>>())
            .field("progress", &state.progress)
            .field("ratio", &state.ratio)
            .field("playing", &state.playing)
            .field("finished", &state.finished)
            .finish()
    }
}

/// Non-owning tween reference, as held by groups
#[derive(Clone)]
pub(crate) struct WeakTween(Weak<TweenInner>);

impl WeakTween {
    pub(crate) fn upgrade(&self) -> Option<Tween> {
        self.0.upgrade().map(|inner| Tween { inner })
    }

    pub(crate) fn is(&self, tween: &Tween) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&tween.inner))
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
