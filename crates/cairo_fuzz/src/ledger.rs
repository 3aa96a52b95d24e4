//! Create/release accounting for library resources.
//!
//! Every cairo object a session creates is wrapped in a [`Tracked`] guard.
//! The guard records the creation when it is built and the release when it
//! is dropped, so a finished session can check that both counts agree per
//! resource kind.

use std::cell::Cell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Target,
    Context,
    Pattern,
    Surface,
    FontFace,
    FontOptions,
    ScaledFont,
    Path,
    Region,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Target,
        ResourceKind::Context,
        ResourceKind::Pattern,
        ResourceKind::Surface,
        ResourceKind::FontFace,
        ResourceKind::FontOptions,
        ResourceKind::ScaledFont,
        ResourceKind::Path,
        ResourceKind::Region,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

const KINDS: usize = ResourceKind::ALL.len();

/// Live counters shared by a session and its guards.
#[derive(Debug, Default)]
pub struct Ledger {
    created: [Cell<u32>; KINDS],
    released: [Cell<u32>; KINDS],
}

impl Ledger {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Wraps `value` and counts it as created.
    pub fn track<T>(self: &Rc<Self>, kind: ResourceKind, value: T) -> Tracked<T> {
        let slot = &self.created[kind.index()];
        slot.set(slot.get() + 1);
        Tracked {
            value,
            kind,
            ledger: Rc::clone(self),
        }
    }

    fn release(&self, kind: ResourceKind) {
        let slot = &self.released[kind.index()];
        slot.set(slot.get() + 1);
    }

    pub fn counts(&self) -> LedgerCounts {
        LedgerCounts {
            created: self.created.each_ref().map(Cell::get),
            released: self.released.each_ref().map(Cell::get),
        }
    }
}

/// Guard that owns a library object and reports its release.
pub struct Tracked<T> {
    value: T,
    kind: ResourceKind,
    ledger: Rc<Ledger>,
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.ledger.release(self.kind);
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .finish()
    }
}

/// Snapshot of a ledger's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    created: [u32; KINDS],
    released: [u32; KINDS],
}

impl LedgerCounts {
    pub fn created(&self, kind: ResourceKind) -> u32 {
        self.created[kind.index()]
    }

    pub fn released(&self, kind: ResourceKind) -> u32 {
        self.released[kind.index()]
    }

    /// True when every kind was released exactly as often as it was created.
    pub fn is_balanced(&self) -> bool {
        self.created == self.released
    }

    pub fn total_created(&self) -> u32 {
        self.created.iter().sum()
    }
}
