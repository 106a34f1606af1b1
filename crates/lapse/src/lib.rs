//! Lapse Tween Engine
//!
//! One-call tweening on top of [`lapse_animation`]: a [`Lapse`] owns a frame
//! clock, an ease registry and a group registry, creates tweens that start
//! playing immediately, and destroys whole groups of them.
//!
//! # Example
//!
//! ```rust
//! use lapse::{Lapse, TweenParams};
//! use std::cell::RefCell;
//! use std::collections::HashMap;
//! use std::rc::Rc;
//!
//! let lapse = Lapse::default();
//! let sprite = Rc::new(RefCell::new(HashMap::from([("x".to_string(), 0.0)])));
//!
//! let tween = lapse
//!     .create(
//!         TweenParams::new()
//!             .duration(1000.0)
//!             .target(&sprite)
//!             .property("x", 100.0)
//!             .group("intro"),
//!     )
//!     .unwrap();
//!
//! lapse.advance(250.0);
//! assert_eq!(sprite.borrow()["x"], 25.0);
//!
//! lapse.destroy_group("intro");
//! assert!(!tween.is_playing());
//! ```

pub mod config;
mod logging;

pub use config::LapseConfig;
pub use lapse_animation::{
    Animatable, AnimationContext, ConfigError, Ease, EaseRegistry, Easing, FrameClock, Group,
    GroupSymbol, Groups, ParamBag, ParamValue, Ticker, TickerConfig, Tween, TweenParams,
};
pub use logging::init_logging;

use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// Tween engine facade
///
/// Everything is single-threaded: tweens, callbacks and frames all run on the
/// thread that owns the `Lapse`.
pub struct Lapse {
    ticker: Rc<Ticker>,
    ctx: AnimationContext,
    config: LapseConfig,
}

impl Lapse {
    /// Engine with the built-in eases
    ///
    /// Fails with [`ConfigError::UnknownEase`] if `config.default_ease` is not
    /// a built-in ease name.
    pub fn new(config: LapseConfig) -> Result<Self, ConfigError> {
        Self::with_eases(config, EaseRegistry::new())
    }

    /// Engine with a caller-provided ease registry
    pub fn with_eases(config: LapseConfig, mut eases: EaseRegistry) -> Result<Self, ConfigError> {
        if let Some(name) = &config.default_ease {
            eases.set_default(name)?;
        }
        Ok(Self::build(config, eases))
    }

    /// Engine configured from a TOML file (see [`LapseConfig::load`])
    pub fn from_config_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = LapseConfig::load(path.as_ref())?;
        Ok(Self::new(config)?)
    }

    fn build(config: LapseConfig, eases: EaseRegistry) -> Self {
        let ticker = Rc::new(Ticker::with_config(config.ticker.clone()));
        ticker.start();
        let ctx = AnimationContext::new(ticker.clone()).with_eases(eases);
        tracing::debug!(
            speed = config.ticker.speed,
            default_ease = ?config.default_ease,
            "Lapse initialized"
        );
        Self {
            ticker,
            ctx,
            config,
        }
    }

    /// Build a tween and start playing it from the beginning
    ///
    /// The returned handle may be dropped; the tween keeps running until it
    /// completes, is stopped or its group is destroyed.
    pub fn create(&self, params: TweenParams) -> Result<Tween, ConfigError> {
        let tween = Tween::new(&self.ctx, params)?;
        tween.play(0.0);
        Ok(tween)
    }

    /// [`Lapse::create`] from a parameter bag, animating `target`
    pub fn create_from_bag<T>(
        &self,
        target: &Rc<std::cell::RefCell<T>>,
        bag: &ParamBag,
    ) -> Result<Tween, ConfigError>
    where
        T: Animatable + 'static,
    {
        self.create(TweenParams::from_bag(bag)?.target(target))
    }

    /// Destroy the group tagged `symbol` and every tween in it
    ///
    /// Returns false, and does nothing, if there is no such group.
    pub fn destroy_group(&self, symbol: impl Into<GroupSymbol>) -> bool {
        let symbol = symbol.into();
        let destroyed = self.ctx.groups().destroy_group(&symbol);
        if !destroyed {
            tracing::debug!(?symbol, "Lapse: no group to destroy");
        }
        destroyed
    }

    /// Emit one frame with an explicit elapsed time
    ///
    /// Returns true while tweens are still playing.
    pub fn advance(&self, elapsed_ms: f64) -> bool {
        self.ticker.advance(elapsed_ms)
    }

    /// Emit one frame using wall-clock time
    pub fn tick(&self) -> bool {
        self.ticker.tick()
    }

    /// Number of tweens currently playing
    pub fn active(&self) -> usize {
        self.ticker.len()
    }

    pub fn context(&self) -> &AnimationContext {
        &self.ctx
    }

    pub fn ticker(&self) -> &Rc<Ticker> {
        &self.ticker
    }

    pub fn groups(&self) -> &Groups {
        self.ctx.groups()
    }

    pub fn config(&self) -> &LapseConfig {
        &self.config
    }
}

impl Default for Lapse {
    fn default() -> Self {
        Self::build(LapseConfig::default(), EaseRegistry::new())
    }
}

impl Drop for Lapse {
    fn drop(&mut self) {
        // Playing tweens hold the context, which holds the ticker
        self.ticker.clear();
    }
}

impl fmt::Debug for Lapse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lapse")
            .field("config", &self.config)
            .field("active", &self.active())
            .field("groups", &self.groups().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[test]
    fn test_unknown_default_ease_is_rejected() {
        let err = Lapse::new(LapseConfig::new().with_default_ease("wobble")).unwrap_err();
        assert_eq!(err, ConfigError::UnknownEase("wobble".into()));
    }

    #[test]
    fn test_configured_default_ease_applies() {
        let lapse = Lapse::new(LapseConfig::new().with_default_ease("ease_in_quad")).unwrap();
        let tween = lapse
            .create(TweenParams::new().duration(100.0))
            .unwrap();
        lapse.advance(50.0);
        assert_eq!(tween.ratio(), 0.25);
    }

    #[test]
    fn test_custom_registry() {
        let eases = EaseRegistry::new().with("step", |p| if p < 0.5 { 0.0 } else { 1.0 });
        let lapse = Lapse::with_eases(LapseConfig::default(), eases).unwrap();
        let tween = lapse
            .create(TweenParams::new().duration(100.0).ease("step"))
            .unwrap();
        lapse.advance(60.0);
        assert_eq!(tween.ratio(), 1.0);
    }

    #[test]
    fn test_ticker_speed_from_config() {
        let lapse = Lapse::new(
            LapseConfig::new().with_ticker(TickerConfig::default().with_speed(2.0)),
        )
        .unwrap();
        let tween = lapse.create(TweenParams::new().duration(100.0)).unwrap();
        lapse.advance(25.0);
        assert_eq!(tween.progress(), 0.5);
    }

    #[test]
    fn test_active_count() {
        let lapse = Lapse::default();
        let sprite = Rc::new(RefCell::new(HashMap::from([("x".to_string(), 0.0)])));
        lapse
            .create(TweenParams::new().duration(10.0).target(&sprite).property("x", 1.0))
            .unwrap();
        lapse.create(TweenParams::new().duration(20.0)).unwrap();
        assert_eq!(lapse.active(), 2);

        lapse.advance(10.0);
        assert_eq!(lapse.active(), 1);
        assert!(!lapse.advance(10.0));
    }

    #[test]
    fn test_drop_releases_playing_tweens() {
        let sentinel = Rc::new(());
        let lapse = Lapse::default();
        let held = sentinel.clone();
        lapse
            .create(TweenParams::new().duration(100.0).group("A").on_complete(
                move |_: &Tween| {
                    let _keep = &held;
                },
            ))
            .unwrap();
        let ticker = Rc::downgrade(lapse.ticker());
        assert_eq!(Rc::strong_count(&sentinel), 2);

        drop(lapse);
        assert_eq!(Rc::strong_count(&sentinel), 1);
        assert!(ticker.upgrade().is_none());
    }

    #[test]
    fn test_failed_create_registers_nothing() {
        let lapse = Lapse::default();
        assert!(lapse.create(TweenParams::new()).is_err());
        assert_eq!(lapse.active(), 0);
    }
}
