//! Component identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Process-unique component handle.
///
/// IDs are allocated on the control thread and travel inside commands, so
/// the control side can refer to a component before the graphics thread has
/// created it. `0` is reserved as NULL.
///
/// IDs are never reused. At one allocation per nanosecond a `u64` lasts
/// several centuries, so exhaustion is not checked.
#[repr(transparent)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize,
    Deserialize,
)]
pub struct SgId(pub u64);

impl SgId {
    /// The NULL handle.
    pub const NULL: Self = Self(0);

    /// Returns true for the NULL handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Maps NULL to `None`.
    #[inline]
    #[must_use]
    pub const fn non_null(self) -> Option<Self> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }

    /// Raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<Option<SgId>> for SgId {
    fn from(value: Option<SgId>) -> Self {
        value.unwrap_or(Self::NULL)
    }
}

impl fmt::Display for SgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic ID source. First ID is `1`.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator whose first ID is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns a fresh ID. Safe to call from any thread.
    #[inline]
    pub fn allocate(&self) -> SgId {
        SgId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Marks `id` as taken so [`IdAllocator::allocate`] never returns it.
    ///
    /// Used when a component is registered under an ID that did not come
    /// from this allocator. NULL is ignored.
    #[inline]
    pub fn reserve(&self, id: SgId) {
        if let Some(after) = id.0.checked_add(1) {
            self.next.fetch_max(after, Ordering::Relaxed);
        }
    }

    /// Number of IDs handed out so far.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let ids = IdAllocator::new();
        assert_eq!(ids.allocate(), SgId(1));
        assert_eq!(ids.allocate(), SgId(2));
        assert_eq!(ids.allocated(), 2);
    }

    #[test]
    fn test_reserve_skips_foreign_ids() {
        let ids = IdAllocator::new();
        ids.reserve(SgId(5));
        assert_eq!(ids.allocate(), SgId(6));

        // Reserving something already passed never moves the cursor back.
        ids.reserve(SgId(2));
        ids.reserve(SgId::NULL);
        assert_eq!(ids.allocate(), SgId(7));
    }

    #[test]
    fn test_null_handling() {
        assert!(SgId::NULL.is_null());
        assert_eq!(SgId::NULL.non_null(), None);
        assert_eq!(SgId(4).non_null(), Some(SgId(4)));
        assert_eq!(SgId::from(None), SgId::NULL);
        assert_eq!(SgId(12).to_string(), "#12");
    }
}
