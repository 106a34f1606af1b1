//! Integration tests for tweens driven by a host-provided frame clock
//!
//! These tests verify that:
//! - Tweens only talk to the clock through `FrameClock`
//! - A playing tween holds exactly one registration, released on stop
//! - Custom `Animatable` targets receive interpolated values

use lapse_animation::{
    Animatable, AnimationContext, FrameClock, TickCallback, TickCallbackId, Tween, TweenParams,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A minimal clock a host event loop might provide: callbacks keyed by a
/// counter, run in key order when the host calls `frame`
#[derive(Default)]
struct HostClock {
    next: Cell<u64>,
    callbacks: RefCell<BTreeMap<u64, Rc<RefCell<TickCallback>>>>,
    ids: RefCell<slotmap::SlotMap<TickCallbackId, u64>>,
    started: Cell<bool>,
    elapsed: Cell<f64>,
}

impl HostClock {
    fn frame(&self, elapsed_ms: f64) {
        if !self.started.get() {
            return;
        }
        self.elapsed.set(elapsed_ms);
        let frame: Vec<_> = self.callbacks.borrow().values().cloned().collect();
        for callback in frame {
            (*callback.borrow_mut())(elapsed_ms);
        }
    }

    fn registrations(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

impl FrameClock for HostClock {
    fn start(&self) {
        self.started.set(true);
    }

    fn add(&self, callback: TickCallback) -> TickCallbackId {
        let key = self.next.get();
        self.next.set(key + 1);
        self.callbacks
            .borrow_mut()
            .insert(key, Rc::new(RefCell::new(callback)));
        self.ids.borrow_mut().insert(key)
    }

    fn remove(&self, id: TickCallbackId) {
        let Some(key) = self.ids.borrow_mut().remove(id) else {
            return;
        };
        let removed = self.callbacks.borrow_mut().remove(&key);
        drop(removed);
    }

    fn elapsed_ms(&self) -> f64 {
        self.elapsed.get()
    }
}

/// A fixed-shape object implementing `Animatable` by hand
#[derive(Debug, Default, PartialEq)]
struct Panel {
    x: f64,
    y: f64,
    opacity: f64,
}

impl Animatable for Panel {
    fn property(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "opacity" => Some(self.opacity),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: f64) {
        match name {
            "x" => self.x = value,
            "y" => self.y = value,
            "opacity" => self.opacity = value,
            _ => {}
        }
    }
}

fn host() -> (Rc<HostClock>, AnimationContext) {
    let clock = Rc::new(HostClock::default());
    clock.start();
    let ctx = AnimationContext::new(clock.clone());
    (clock, ctx)
}

/// A tween registers once on play and deregisters on stop
#[test]
fn test_registration_follows_play_state() {
    let (clock, ctx) = host();
    let tween = Tween::new(&ctx, TweenParams::new().duration(100.0)).unwrap();
    assert_eq!(clock.registrations(), 0);

    tween.play(0.0);
    tween.play(0.0);
    assert_eq!(clock.registrations(), 1);

    tween.stop();
    assert_eq!(clock.registrations(), 0);

    tween.resume();
    assert_eq!(clock.registrations(), 1);

    tween.destroy();
    assert_eq!(clock.registrations(), 0);
}

/// Struct targets are animated through their `Animatable` impl
#[test]
fn test_struct_target() {
    let (clock, ctx) = host();
    let panel = Rc::new(RefCell::new(Panel {
        x: 10.0,
        y: 0.0,
        opacity: 0.0,
    }));

    let tween = Tween::new(
        &ctx,
        TweenParams::new()
            .duration(400.0)
            .target(&panel)
            .properties_from([("x", 50.0), ("opacity", 1.0)]),
    )
    .unwrap();
    tween.play(0.0);

    clock.frame(100.0);
    assert_eq!(
        *panel.borrow(),
        Panel {
            x: 20.0,
            y: 0.0,
            opacity: 0.25
        }
    );

    for _ in 0..3 {
        clock.frame(100.0);
    }
    assert_eq!(panel.borrow().x, 50.0);
    assert_eq!(panel.borrow().opacity, 1.0);
    assert_eq!(clock.registrations(), 0);
}

/// Missing struct fields surface as unknown properties
#[test]
fn test_struct_target_unknown_field() {
    let (_clock, ctx) = host();
    let panel = Rc::new(RefCell::new(Panel::default()));
    let err = Tween::new(
        &ctx,
        TweenParams::new()
            .duration(100.0)
            .target(&panel)
            .property("rotation", 90.0),
    )
    .unwrap_err();
    assert_eq!(
        err,
        lapse_animation::ConfigError::UnknownProperty("rotation".to_string())
    );
}

/// Several tweens on one target each own their properties
#[test]
fn test_parallel_tweens_on_one_target() {
    let (clock, ctx) = host();
    let panel = Rc::new(RefCell::new(Panel::default()));

    let horizontal = Tween::new(
        &ctx,
        TweenParams::new().duration(100.0).target(&panel).property("x", 100.0),
    )
    .unwrap();
    let vertical = Tween::new(
        &ctx,
        TweenParams::new().duration(200.0).target(&panel).property("y", 100.0),
    )
    .unwrap();
    horizontal.play(0.0);
    vertical.play(0.0);

    clock.frame(100.0);
    assert_eq!(panel.borrow().x, 100.0);
    assert_eq!(panel.borrow().y, 50.0);
    assert!(horizontal.is_finished());
    assert!(vertical.is_playing());
    assert_eq!(clock.registrations(), 1);
}
