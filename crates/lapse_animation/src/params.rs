//! Tween parameters
//!
//! [`TweenParams`] is the typed description of a tween: configuration
//! (duration, ease, callbacks, groups) kept apart from the ordered map of
//! properties to animate.
//!
//! Parameter bags (`$`-prefixed configuration keys mixed with property keys,
//! e.g. loaded from JSON) are accepted through [`TweenParams::from_bag`].

use crate::easing::Ease;
use crate::error::{ConfigError, Result};
use crate::group::GroupSymbol;
use crate::tween::Tween;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::rc::{Rc, Weak};

/// Marker that distinguishes configuration keys from property keys in a bag
pub const OPTION_MARKER: char = '$';

/// An object whose numeric properties can be animated
pub trait Animatable {
    /// Current value of `name`, `None` if the object has no such property
    fn property(&self, name: &str) -> Option<f64>;

    /// Write a new value for `name`
    fn set_property(&mut self, name: &str, value: f64);
}

impl<S: BuildHasher> Animatable for HashMap<String, f64, S> {
    fn property(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }

    fn set_property(&mut self, name: &str, value: f64) {
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.insert(name.to_string(), value);
            }
        }
    }
}

impl<S: BuildHasher> Animatable for IndexMap<String, f64, S> {
    fn property(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }

    fn set_property(&mut self, name: &str, value: f64) {
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.insert(name.to_string(), value);
            }
        }
    }
}

/// Weak reference to the animated object
pub type Target = Weak<RefCell<dyn Animatable>>;

/// Notification hook, receives the tween that fired it
pub type TweenCallback = Box<dyn FnMut(&Tween)>;

/// A value in a parameter bag
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    fn as_number(&self, key: &str) -> Result<f64> {
        match self {
            ParamValue::Number(n) => Ok(*n),
            ParamValue::Text(_) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                expected: "a number",
            }),
        }
    }

    fn as_text(&self, key: &str) -> Result<&str> {
        match self {
            ParamValue::Text(s) => Ok(s),
            ParamValue::Number(_) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                expected: "a string",
            }),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

/// Ordered, open parameter map
pub type ParamBag = IndexMap<String, ParamValue>;

/// Everything needed to build or reset a tween
///
/// ```
/// use lapse_animation::{Easing, TweenParams};
/// use std::cell::RefCell;
/// use std::collections::HashMap;
/// use std::rc::Rc;
///
/// let sprite = Rc::new(RefCell::new(HashMap::from([("x".to_string(), 0.0)])));
/// let params = TweenParams::new()
///     .duration(1000.0)
///     .target(&sprite)
///     .ease(Easing::EaseOutCubic)
///     .property("x", 100.0);
/// assert_eq!(params.properties().len(), 1);
/// ```
#[derive(Default)]
pub struct TweenParams {
    pub(crate) duration: Option<f64>,
    pub(crate) target: Option<Target>,
    pub(crate) ease: Option<Ease>,
    pub(crate) on_update: Option<TweenCallback>,
    pub(crate) on_complete: Option<TweenCallback>,
    pub(crate) groups: SmallVec<[GroupSymbol; 1]>,
    pub(crate) properties: IndexMap<String, f64>,
}

impl TweenParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a parameter bag into configuration and properties
    ///
    /// Keys starting with [`OPTION_MARKER`] configure the tween:
    /// `$duration` (number), `$ease` (registered ease name) and `$group`
    /// (string or number, may repeat through the typed builder only). A
    /// numeric `$group` names the same group as the equal integer, so
    /// `{"$group": 7}` joins the group `7`.
    /// Every other key is a property to animate and must be a number.
    /// Unknown `$` keys are rejected, so properties whose names start with
    /// the marker can only be animated through [`TweenParams::property`].
    pub fn from_bag(bag: &ParamBag) -> Result<Self> {
        let mut params = Self::new();
        for (key, value) in bag {
            match key.strip_prefix(OPTION_MARKER) {
                Some("duration") => params.duration = Some(value.as_number(key)?),
                Some("ease") => params.ease = Some(Ease::from(value.as_text(key)?)),
                Some("group") => params.groups.push(match value {
                    ParamValue::Text(s) => GroupSymbol::from(s.as_str()),
                    ParamValue::Number(n) => GroupSymbol::from(*n),
                }),
                Some(_) => return Err(ConfigError::UnknownOption(key.clone())),
                None => {
                    params.properties.insert(key.clone(), value.as_number(key)?);
                }
            }
        }
        Ok(params)
    }

    /// Duration in milliseconds
    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = Some(ms);
        self
    }

    /// Object receiving the interpolated values
    pub fn target<T: Animatable + 'static>(self, target: &Rc<RefCell<T>>) -> Self {
        let target: Rc<RefCell<dyn Animatable>> = target.clone();
        self.target_weak(Rc::downgrade(&target))
    }

    pub fn target_weak(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn ease(mut self, ease: impl Into<Ease>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    /// Called on every applied frame while playing
    pub fn on_update<F: FnMut(&Tween) + 'static>(mut self, callback: F) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    /// Called once when a playing tween reaches the end
    pub fn on_complete<F: FnMut(&Tween) + 'static>(mut self, callback: F) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Join the group `symbol` when the tween is built
    pub fn group(mut self, symbol: impl Into<GroupSymbol>) -> Self {
        self.groups.push(symbol.into());
        self
    }

    /// Animate `name` towards `end`
    pub fn property(mut self, name: impl Into<String>, end: f64) -> Self {
        self.properties.insert(name.into(), end);
        self
    }

    pub fn properties_from<I, K>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn properties(&self) -> &IndexMap<String, f64> {
        &self.properties
    }

    pub fn duration_ms(&self) -> Option<f64> {
        self.duration
    }

    pub fn groups(&self) -> &[GroupSymbol] {
        &self.groups
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}

impl fmt::Debug for TweenParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenParams")
            .field("duration", &self.duration)
            .field("has_target", &self.target.is_some())
            .field("ease", &self.ease)
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("groups", &self.groups)
            .field("properties", &self.properties)
            .finish()
    }
}
