//! Tween groups
//!
//! A [`Group`] gathers tweens under an opaque [`GroupSymbol`]. Destroying a
//! group destroys every member; a group whose last member leaves (completion,
//! removal, destruction or the tween being dropped) destroys itself.
//!
//! [`Groups`] is the registry: one group per distinct symbol, created on the
//! first membership request and dropped from the registry when destroyed.
//!
//! Groups never keep tweens alive; they hold weak references only.

use crate::tween::{Tween, WeakTween};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

trait SymbolKey: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_key(&self, other: &dyn SymbolKey) -> bool;
}

impl<T: PartialEq + fmt::Debug + 'static> SymbolKey for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_key(&self, other: &dyn SymbolKey) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

#[derive(Debug, PartialEq)]
struct UniqueSymbol(u64);

static NEXT_UNIQUE: AtomicU64 = AtomicU64::new(0);

/// Opaque group key
///
/// Wraps any comparable value. Symbols of different underlying types are never
/// equal. String slices are stored as `String`, so `"a"` and `"a".to_string()`
/// name the same group; numbers converted with `From` are normalised, so `7`,
/// `7u64` and `7.0` name the same group.
#[derive(Clone)]
pub struct GroupSymbol(Rc<dyn SymbolKey>);

impl GroupSymbol {
    pub fn new<T: PartialEq + fmt::Debug + 'static>(key: T) -> Self {
        Self(Rc::new(key))
    }

    /// A fresh symbol equal only to itself and its clones
    pub fn unique() -> Self {
        Self::new(UniqueSymbol(NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed)))
    }
}

impl PartialEq for GroupSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_key(&*other.0)
    }
}

impl fmt::Debug for GroupSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupSymbol({:?})", self.0)
    }
}

impl From<&str> for GroupSymbol {
    fn from(key: &str) -> Self {
        Self::new(key.to_string())
    }
}

impl From<String> for GroupSymbol {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

// Integers of every width name the same group as the equal `i64`
macro_rules! symbol_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for GroupSymbol {
                fn from(key: $ty) -> Self {
                    Self::new(i64::from(key))
                }
            }
        )*
    };
}

macro_rules! symbol_from_wide_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for GroupSymbol {
                fn from(key: $ty) -> Self {
                    match i64::try_from(key) {
                        Ok(key) => Self::new(key),
                        Err(_) => Self::new(key),
                    }
                }
            }
        )*
    };
}

symbol_from_int!(i8, i16, i32, u8, u16, u32);
symbol_from_wide_int!(u64, usize, isize);

impl From<i64> for GroupSymbol {
    fn from(key: i64) -> Self {
        Self::new(key)
    }
}

/// Integral floats (e.g. numeric `$group` values from JSON) name the same
/// group as the equal integer; other floats compare as `f64`
impl From<f64> for GroupSymbol {
    fn from(key: f64) -> Self {
        if key.fract() == 0.0 && key >= i64::MIN as f64 && key < i64::MAX as f64 {
            Self::new(key as i64)
        } else {
            Self::new(key)
        }
    }
}

type GroupList = RefCell<Vec<Rc<Group>>>;

/// A set of tween memberships under one symbol
pub struct Group {
    symbol: RefCell<Option<GroupSymbol>>,
    members: RefCell<Vec<WeakTween>>,
    destroyed: Cell<bool>,
    registry: Weak<GroupList>,
}

impl Group {
    fn new(symbol: GroupSymbol, registry: Weak<GroupList>) -> Self {
        Self {
            symbol: RefCell::new(Some(symbol)),
            members: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
            registry,
        }
    }

    /// The group's symbol, `None` once destroyed
    pub fn symbol(&self) -> Option<GroupSymbol> {
        self.symbol.borrow().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Number of memberships, including members whose handle was dropped
    /// but not yet pruned
    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    /// Live members in insertion order
    pub fn members(&self) -> Vec<Tween> {
        self.members
            .borrow()
            .iter()
            .filter_map(WeakTween::upgrade)
            .collect()
    }

    pub fn contains(&self, tween: &Tween) -> bool {
        self.members.borrow().iter().any(|m| m.is(tween))
    }

    /// Append a membership. No duplicate check: adding twice means the tween
    /// must be removed twice.
    pub fn add(&self, tween: &Tween) {
        let Some(symbol) = self.symbol() else {
            tracing::warn!("Group: cannot add a tween to a destroyed group");
            return;
        };
        self.members.borrow_mut().push(tween.downgrade());
        tween.remember_group(symbol);
    }

    /// Remove one membership of `tween`
    ///
    /// Logs a warning and changes nothing if the tween is not a member.
    /// Destroys the group when the last member leaves.
    pub fn remove(&self, tween: &Tween) {
        let now_empty = {
            let mut members = self.members.borrow_mut();
            let Some(index) = members.iter().position(|m| m.is(tween)) else {
                tracing::warn!(
                    symbol = ?self.symbol(),
                    "Group: trying to remove a tween that is not a member"
                );
                return;
            };
            members.remove(index);
            members.is_empty()
        };

        if let Some(symbol) = self.symbol() {
            tween.forget_group(&symbol);
        }

        if now_empty {
            self.destroy();
        }
    }

    /// Destroy every member, then leave the registry. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }

        // Members remove themselves from `self.members` while being destroyed
        let members = self.members();
        tracing::debug!(
            symbol = ?self.symbol(),
            members = members.len(),
            "Group: destroying"
        );
        for tween in &members {
            tween.destroy();
        }
        self.members.borrow_mut().clear();

        self.symbol.borrow_mut().take();
        if let Some(registry) = self.registry.upgrade() {
            Groups { inner: registry }.on_group_destroyed(self);
        }
    }

    /// Drop memberships of tweens that no longer exist
    pub(crate) fn prune(&self) {
        let now_empty = {
            let mut members = self.members.borrow_mut();
            let before = members.len();
            members.retain(WeakTween::is_alive);
            if members.len() == before {
                return;
            }
            members.is_empty()
        };
        if now_empty {
            self.destroy();
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("symbol", &self.symbol())
            .field("members", &self.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Registry of groups by symbol
///
/// Cloning yields another handle to the same registry.
///
/// ```
/// use lapse_animation::{AnimationContext, FrameClock, Ticker, Tween, TweenParams};
/// use std::rc::Rc;
///
/// let ticker = Rc::new(Ticker::new());
/// ticker.start();
/// let ctx = AnimationContext::new(ticker.clone());
///
/// let tween = Tween::new(&ctx, TweenParams::new().duration(100.0).group("menu")).unwrap();
/// assert!(ctx.groups().get_group(&"menu".into()).is_some());
///
/// tween.destroy();
/// assert!(ctx.groups().get_group(&"menu".into()).is_none());
/// ```
#[derive(Clone, Default)]
pub struct Groups {
    inner: Rc<GroupList>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tween` to the group for `symbol`, creating the group if needed
    pub fn add_to(&self, symbol: impl Into<GroupSymbol>, tween: &Tween) {
        let symbol = symbol.into();
        let group = match self.get_group(&symbol) {
            Some(group) => group,
            None => {
                let group = Rc::new(Group::new(symbol.clone(), Rc::downgrade(&self.inner)));
                self.inner.borrow_mut().push(Rc::clone(&group));
                tracing::debug!(
                    ?symbol,
                    count = self.len(),
                    "Groups: group created"
                );
                group
            }
        };
        group.add(tween);
    }

    /// Remove `tween` from the group for `symbol`
    ///
    /// Logs a warning if there is no such group.
    pub fn remove_from(&self, symbol: &GroupSymbol, tween: &Tween) {
        match self.get_group(symbol) {
            Some(group) => group.remove(tween),
            None => tracing::warn!(
                ?symbol,
                "Groups: trying to remove a tween from an unknown group"
            ),
        }
    }

    /// Find the group for `symbol`
    pub fn get_group(&self, symbol: &GroupSymbol) -> Option<Rc<Group>> {
        self.inner
            .borrow()
            .iter()
            .find(|group| group.symbol.borrow().as_ref() == Some(symbol))
            .cloned()
    }

    /// Destroy the group for `symbol` and all of its tweens
    ///
    /// Returns false if no such group exists.
    pub fn destroy_group(&self, symbol: &GroupSymbol) -> bool {
        match self.get_group(symbol) {
            Some(group) => {
                group.destroy();
                true
            }
            None => false,
        }
    }

    /// Number of live groups
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub(crate) fn prune(&self, symbol: &GroupSymbol) {
        if let Some(group) = self.get_group(symbol) {
            group.prune();
        }
    }

    pub(crate) fn on_group_destroyed(&self, group: &Group) {
        let removed = {
            let mut groups = self.inner.borrow_mut();
            groups
                .iter()
                .position(|g| std::ptr::eq(Rc::as_ptr(g), group))
                .map(|index| groups.remove(index))
        };
        tracing::debug!(count = self.len(), "Groups: group removed");
        drop(removed);
    }
}

impl fmt::Debug for Groups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FrameClock, Ticker};
    use crate::context::AnimationContext;
    use crate::params::TweenParams;

    fn setup() -> (Rc<Ticker>, AnimationContext) {
        let ticker = Rc::new(Ticker::new());
        ticker.start();
        let ctx = AnimationContext::new(ticker.clone());
        (ticker, ctx)
    }

    fn timer(ctx: &AnimationContext, ms: f64) -> Tween {
        Tween::new(ctx, TweenParams::new().duration(ms)).unwrap()
    }

    #[test]
    fn test_symbol_equality() {
        assert_eq!(GroupSymbol::from("a"), GroupSymbol::from("a".to_string()));
        assert_ne!(GroupSymbol::from("a"), GroupSymbol::from("b"));
        assert_ne!(GroupSymbol::from("1"), GroupSymbol::from(1));
        assert_ne!(GroupSymbol::new(1u32), GroupSymbol::new(1u64));

        let unique = GroupSymbol::unique();
        assert_eq!(unique, unique.clone());
        assert_ne!(unique, GroupSymbol::unique());
    }

    #[test]
    fn test_numeric_symbols_are_normalised() {
        assert_eq!(GroupSymbol::from(7), GroupSymbol::from(7u64));
        assert_eq!(GroupSymbol::from(7), GroupSymbol::from(7.0));
        assert_eq!(GroupSymbol::from(-3i8), GroupSymbol::from(-3.0));
        assert_eq!(GroupSymbol::from(0.5), GroupSymbol::from(0.5));
        assert_ne!(GroupSymbol::from(0.5), GroupSymbol::from(0));
        assert_eq!(GroupSymbol::from(u64::MAX), GroupSymbol::from(u64::MAX));
        assert_ne!(GroupSymbol::from(u64::MAX), GroupSymbol::from(-1));
    }

    #[test]
    fn test_add_to_creates_group_lazily() {
        let (_ticker, ctx) = setup();
        let groups = ctx.groups();
        assert!(groups.is_empty());

        let a = timer(&ctx, 100.0);
        let b = timer(&ctx, 100.0);
        groups.add_to("A", &a);
        groups.add_to("A", &b);

        assert_eq!(groups.len(), 1);
        let group = groups.get_group(&"A".into()).unwrap();
        assert_eq!(group.len(), 2);
        assert!(group.contains(&a));
        assert_eq!(a.groups(), vec![GroupSymbol::from("A")]);
    }

    #[test]
    fn test_remove_non_member_is_a_warning() {
        let (_ticker, ctx) = setup();
        let a = timer(&ctx, 100.0);
        let stranger = timer(&ctx, 100.0);
        ctx.groups().add_to("A", &a);

        let group = ctx.groups().get_group(&"A".into()).unwrap();
        group.remove(&stranger);
        assert_eq!(group.len(), 1);
        assert!(!group.is_destroyed());

        // Unknown symbol: logged, nothing changes
        ctx.groups().remove_from(&"B".into(), &a);
        assert_eq!(ctx.groups().len(), 1);
    }

    #[test]
    fn test_last_removal_destroys_group() {
        let (_ticker, ctx) = setup();
        let a = timer(&ctx, 100.0);
        ctx.groups().add_to("A", &a);
        let group = ctx.groups().get_group(&"A".into()).unwrap();

        ctx.groups().remove_from(&"A".into(), &a);

        assert!(group.is_destroyed());
        assert_eq!(group.symbol(), None);
        assert!(ctx.groups().get_group(&"A".into()).is_none());
        assert!(a.groups().is_empty());
    }

    #[test]
    fn test_destroy_cascades_and_is_idempotent() {
        let (ticker, ctx) = setup();
        let t1 = timer(&ctx, 1000.0);
        let t2 = timer(&ctx, 1000.0);
        ctx.groups().add_to("A", &t1);
        ctx.groups().add_to("A", &t2);
        t1.play(0.0);
        t2.play(0.0);
        assert_eq!(ticker.len(), 2);

        let group = ctx.groups().get_group(&"A".into()).unwrap();
        group.destroy();

        assert!(!t1.is_playing());
        assert!(!t2.is_playing());
        assert_eq!(ticker.len(), 0);
        assert!(ctx.groups().is_empty());

        group.destroy();
        assert!(ctx.groups().is_empty());
    }

    #[test]
    fn test_destroy_group_unknown_symbol() {
        let (_ticker, ctx) = setup();
        assert!(!ctx.groups().destroy_group(&"nope".into()));
    }

    #[test]
    fn test_dropped_member_prunes_group() {
        let (_ticker, ctx) = setup();
        let keep = timer(&ctx, 100.0);
        ctx.groups().add_to("A", &keep);
        {
            let gone = timer(&ctx, 100.0);
            ctx.groups().add_to("A", &gone);
            assert_eq!(ctx.groups().get_group(&"A".into()).unwrap().len(), 2);
        }
        assert_eq!(ctx.groups().get_group(&"A".into()).unwrap().len(), 1);

        drop(keep);
        assert!(ctx.groups().get_group(&"A".into()).is_none());
    }

    #[test]
    fn test_group_does_not_extend_lifetime() {
        let (_ticker, ctx) = setup();
        let keep = timer(&ctx, 100.0);
        ctx.groups().add_to("A", &keep);
        let group = ctx.groups().get_group(&"A".into()).unwrap();

        let weak = {
            let tween = timer(&ctx, 10.0);
            group.add(&tween);
            tween.downgrade()
        };

        assert!(!weak.is_alive());
        assert_eq!(group.members(), vec![keep]);
    }

    #[test]
    fn test_add_to_destroyed_group_is_ignored() {
        let (_ticker, ctx) = setup();
        let a = timer(&ctx, 100.0);
        ctx.groups().add_to("A", &a);
        let group = ctx.groups().get_group(&"A".into()).unwrap();
        group.destroy();

        let b = timer(&ctx, 100.0);
        group.add(&b);
        assert!(group.is_empty());
        assert!(b.groups().is_empty());
    }
}
