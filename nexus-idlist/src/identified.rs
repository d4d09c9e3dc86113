//! Identifier contract for values stored in an [`IdList`](crate::IdList).

use std::sync::Arc;

/// Identifier reported by a node whose value is no longer available.
///
/// Only observing nodes can hit this: once every strong reference to the
/// observed value is dropped, [`Node::value_id`](crate::Node::value_id)
/// returns `VACANT_ID`.
pub const VACANT_ID: i64 = -1;

/// Types that carry a stable, totally-ordered 64-bit identifier.
///
/// The identifier is the sort and search key of an [`IdList`](crate::IdList).
/// It must not change while the value is enrolled; the list captures it at
/// enrolment and never re-reads it for ordering.
///
/// # Example
///
/// ```
/// use nexus_idlist::Identified;
///
/// struct Order {
///     id: i64,
///     qty: u64,
/// }
///
/// impl Identified for Order {
///     fn id(&self) -> i64 {
///         self.id
///     }
/// }
///
/// let order = Order { id: 7, qty: 100 };
/// assert_eq!(order.id(), 7);
/// ```
pub trait Identified {
    /// Returns the identifier of this value.
    fn id(&self) -> i64;
}

impl<T: Identified + ?Sized> Identified for &T {
    #[inline]
    fn id(&self) -> i64 {
        (**self).id()
    }
}

impl<T: Identified + ?Sized> Identified for Box<T> {
    #[inline]
    fn id(&self) -> i64 {
        (**self).id()
    }
}

impl<T: Identified + ?Sized> Identified for Arc<T> {
    #[inline]
    fn id(&self) -> i64 {
        (**self).id()
    }
}
