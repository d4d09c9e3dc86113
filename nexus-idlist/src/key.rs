//! Sentinel-based slot handle for arena links.
//!
//! Chain links and quick-reference entries point at arena slots. A reserved
//! sentinel (`Slot::NONE`) stands in for `Option<usize>` so that an entry's
//! `prev`/`next` pair stays two machine words.

/// Stable handle to an occupied slot in a chain's arena.
///
/// A slot stays valid until the entry it names is removed. `Slot::NONE`
/// marks an empty link (no previous / next entry, empty head or tail).
///
/// # Example
///
/// ```ignore
/// let slot = Slot::from_usize(3);
/// assert!(slot.is_some());
/// assert!(Slot::NONE.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Slot(usize);

impl Slot {
    /// Sentinel value representing "no slot".
    pub(crate) const NONE: Self = Slot(usize::MAX);

    /// Creates a slot from an arena index.
    #[inline]
    pub(crate) const fn from_usize(val: usize) -> Self {
        Slot(val)
    }

    /// Returns the arena index.
    #[inline]
    pub(crate) const fn as_usize(self) -> usize {
        self.0
    }

    /// Returns `true` if this is the sentinel value.
    #[inline]
    pub(crate) const fn is_none(self) -> bool {
        self.0 == usize::MAX
    }

    /// Returns `true` if this is NOT the sentinel value.
    #[inline]
    pub(crate) const fn is_some(self) -> bool {
        !self.is_none()
    }
}
