//! Shared animation context
//!
//! Bundles the frame clock, the ease registry and the group registry every
//! tween needs. Contexts are cheap to clone; clones share the same state.

use crate::clock::FrameClock;
use crate::easing::EaseRegistry;
use crate::group::Groups;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub struct AnimationContext {
    clock: Rc<dyn FrameClock>,
    eases: Rc<EaseRegistry>,
    groups: Groups,
}

impl AnimationContext {
    /// Context over `clock` with the built-in eases and an empty group registry
    pub fn new(clock: Rc<dyn FrameClock>) -> Self {
        Self {
            clock,
            eases: Rc::new(EaseRegistry::new()),
            groups: Groups::new(),
        }
    }

    /// Replace the ease registry
    pub fn with_eases(mut self, eases: EaseRegistry) -> Self {
        self.eases = Rc::new(eases);
        self
    }

    /// Replace the group registry, e.g. to share one between contexts
    pub fn with_groups(mut self, groups: Groups) -> Self {
        self.groups = groups;
        self
    }

    pub fn clock(&self) -> &Rc<dyn FrameClock> {
        &self.clock
    }

    pub fn eases(&self) -> &EaseRegistry {
        &self.eases
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }
}

impl fmt::Debug for AnimationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationContext")
            .field("eases", &self.eases)
            .field("groups", &self.groups.len())
            .finish_non_exhaustive()
    }
}
