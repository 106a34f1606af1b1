//! Easing functions and ease resolution
//!
//! An ease maps linear progress (0.0 to 1.0) to an animation ratio. The ratio
//! is allowed to leave the unit range (back and elastic curves overshoot).
//!
//! Tweens accept an ease in three forms (see [`Ease`]): a registered name,
//! a built-in [`Easing`] curve, or an arbitrary function. Names are resolved
//! through an [`EaseRegistry`].

use crate::error::ConfigError;
use rustc_hash::FxHashMap;
use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;

/// A resolved ease function: `progress -> ratio`
pub type EaseFn = Rc<dyn Fn(f64) -> f64>;

/// Built-in easing curves
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInBack,
    EaseOutBack,
    EaseOutElastic,
    CubicBezier(f64, f64, f64, f64),
}

const BACK_C1: f64 = 1.70158;
const BACK_C3: f64 = BACK_C1 + 1.0;

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::EaseOutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u.powi(3) + BACK_C1 * u.powi(2)
            }
            Easing::EaseOutElastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }

    /// Wrap the curve as a shareable ease function
    pub fn to_fn(self) -> EaseFn {
        Rc::new(move |t| self.apply(t))
    }
}

/// Names under which [`EaseRegistry::new`] registers the built-in curves
const BUILTIN_EASES: &[(&str, Easing)] = &[
    ("linear", Easing::Linear),
    ("ease_in", Easing::EaseIn),
    ("ease_out", Easing::EaseOut),
    ("ease_in_out", Easing::EaseInOut),
    ("ease_in_quad", Easing::EaseInQuad),
    ("ease_out_quad", Easing::EaseOutQuad),
    ("ease_in_out_quad", Easing::EaseInOutQuad),
    ("ease_in_cubic", Easing::EaseInCubic),
    ("ease_out_cubic", Easing::EaseOutCubic),
    ("ease_in_out_cubic", Easing::EaseInOutCubic),
    ("ease_in_quart", Easing::EaseInQuart),
    ("ease_out_quart", Easing::EaseOutQuart),
    ("ease_in_out_quart", Easing::EaseInOutQuart),
    ("ease_in_back", Easing::EaseInBack),
    ("ease_out_back", Easing::EaseOutBack),
    ("ease_out_elastic", Easing::EaseOutElastic),
];

/// How a tween asks for its ease
#[derive(Clone)]
pub enum Ease {
    /// Looked up in the [`EaseRegistry`] when the tween is initialized
    Named(String),
    /// A built-in curve
    Curve(Easing),
    /// Any function of progress
    Function(EaseFn),
}

impl Ease {
    /// Create an ease from a closure
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        Ease::Function(Rc::new(f))
    }
}

impl fmt::Debug for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Ease::Curve(easing) => f.debug_tuple("Curve").field(easing).finish(),
            Ease::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<Easing> for Ease {
    fn from(easing: Easing) -> Self {
        Ease::Curve(easing)
    }
}

impl From<&str> for Ease {
    fn from(name: &str) -> Self {
        Ease::Named(name.to_string())
    }
}

impl From<String> for Ease {
    fn from(name: String) -> Self {
        Ease::Named(name)
    }
}

/// Lookup table from ease name to ease function
///
/// Also holds the ease used when a tween does not ask for one.
pub struct EaseRegistry {
    eases: FxHashMap<String, EaseFn>,
    default_ease: EaseFn,
}

impl EaseRegistry {
    /// Registry pre-populated with the built-in curves, defaulting to linear
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (name, easing) in BUILTIN_EASES {
            registry.register(*name, easing.to_fn());
        }
        registry
    }

    /// Registry with no names registered, defaulting to linear
    pub fn empty() -> Self {
        Self {
            eases: FxHashMap::default(),
            default_ease: Easing::Linear.to_fn(),
        }
    }

    /// Register (or replace) an ease under `name`
    pub fn register(&mut self, name: impl Into<String>, ease: EaseFn) {
        self.eases.insert(name.into(), ease);
    }

    /// Builder: register a closure under `name`
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        self.register(name, Rc::new(f));
        self
    }

    pub fn get(&self, name: &str) -> Option<EaseFn> {
        self.eases.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.eases.contains_key(name)
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.eases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eases.is_empty()
    }

    /// Use the ease registered under `name` for tweens that specify none
    pub fn set_default(&mut self, name: &str) -> Result<(), ConfigError> {
        self.default_ease = self
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEase(name.to_string()))?;
        Ok(())
    }

    pub fn default_ease(&self) -> EaseFn {
        Rc::clone(&self.default_ease)
    }

    /// Resolve a requested ease into a callable function
    pub fn resolve(&self, ease: Option<&Ease>) -> Result<EaseFn, ConfigError> {
        match ease {
            None => Ok(self.default_ease()),
            Some(Ease::Named(name)) => self
                .get(name)
                .ok_or_else(|| ConfigError::UnknownEase(name.clone())),
            Some(Ease::Curve(easing)) => Ok(easing.to_fn()),
            Some(Ease::Function(f)) => Ok(Rc::clone(f)),
        }
    }
}

impl Default for EaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EaseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.eases.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("EaseRegistry").field("names", &names).finish()
    }
}

/// Cubic bezier easing calculation (matches CSS / browser implementations).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t;

    // Solve for parameter `p` where bezier_x(p) == x using Newton-Raphson,
    // falling back to binary search if the slope is too flat.
    let mut p = x; // initial guess
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2);
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break; // slope too flat, switch to binary search
        }
        p -= err / slope;
    }

    // Binary search fallback (always converges)
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2)
}

/// Evaluate cubic bezier at parameter t: B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    // Horner form: ((1-3p2+3p1)t + 3p2-6p1)t + 3p1) * t
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

/// Derivative of cubic bezier: B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_hit_endpoints() {
        for (name, easing) in BUILTIN_EASES {
            assert!(easing.apply(0.0).abs() < 1e-9, "{name} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{name} at 1");
        }
    }

    #[test]
    fn test_back_overshoots() {
        assert!(Easing::EaseInBack.apply(0.2) < 0.0);
        assert!(Easing::EaseOutBack.apply(0.8) > 1.0);
    }

    #[test]
    fn test_cubic_bezier_linear_control_points() {
        let ease = Easing::CubicBezier(0.25, 0.25, 0.75, 0.75);
        assert!((ease.apply(0.3) - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_registry_resolves_names() {
        let registry = EaseRegistry::new();
        let ease = registry
            .resolve(Some(&Ease::from("ease_in_quad")))
            .unwrap();
        assert_eq!(ease(0.5), 0.25);
        assert_eq!(registry.len(), BUILTIN_EASES.len());
    }

    #[test]
    fn test_registry_unknown_name() {
        let registry = EaseRegistry::new();
        let err = registry
            .resolve(Some(&Ease::from("nonexistent")))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::UnknownEase("nonexistent".into()));
    }

    #[test]
    fn test_default_ease() {
        let mut registry = EaseRegistry::new().with("half", |t| t * 0.5);
        assert_eq!(registry.resolve(None).unwrap()(0.4), 0.4);

        registry.set_default("half").unwrap();
        assert_eq!(registry.resolve(None).unwrap()(0.4), 0.2);
        assert!(registry.set_default("missing").is_err());
    }
}
