//! Lapse Animation Core
//!
//! Time-based tweening of numeric properties, driven by an external frame clock.
//!
//! # Features
//!
//! - **Tweens**: Snapshot start values, interpolate towards end values over a duration
//! - **Eases**: Built-in curves, cubic beziers, custom functions and a name registry
//! - **Groups**: Tag tweens with symbols and destroy a whole group at once
//! - **Frame Clock**: Tweens hold a clock callback only while they play
//!
//! # Example
//!
//! ```rust
//! use lapse_animation::{AnimationContext, FrameClock, Ticker, Tween, TweenParams};
//! use std::cell::RefCell;
//! use std::collections::HashMap;
//! use std::rc::Rc;
//!
//! let ticker = Rc::new(Ticker::new());
//! ticker.start();
//! let ctx = AnimationContext::new(ticker.clone());
//!
//! let sprite = Rc::new(RefCell::new(HashMap::from([("alpha".to_string(), 1.0)])));
//! let fade = Tween::new(
//!     &ctx,
//!     TweenParams::new()
//!         .duration(200.0)
//!         .target(&sprite)
//!         .property("alpha", 0.0)
//!         .group("menu"),
//! )
//! .unwrap();
//! fade.play(0.0);
//!
//! ticker.advance(100.0);
//! assert_eq!(sprite.borrow()["alpha"], 0.5);
//!
//! // Stop everything tagged "menu"
//! ctx.groups().destroy_group(&"menu".into());
//! assert!(!fade.is_playing());
//! ```

pub mod clock;
pub mod context;
pub mod easing;
pub mod error;
pub mod group;
pub mod params;
pub mod tween;

pub use clock::{FrameClock, TickCallback, TickCallbackId, Ticker, TickerConfig};
pub use context::AnimationContext;
pub use easing::{Ease, EaseFn, EaseRegistry, Easing};
pub use error::ConfigError;
pub use group::{Group, GroupSymbol, Groups};
pub use params::{Animatable, ParamBag, ParamValue, Target, TweenCallback, TweenParams, OPTION_MARKER};
pub use tween::Tween;
