//! Duplicate-suppressing collections of shared values.
//!
//! Both sets hold `Arc<T>` and keep insertion order. Membership is decided
//! by an [`Equality`] fixed at construction:
//!
//! ```text
//! Identity   same allocation (Arc::ptr_eq)
//! Value      same allocation, or T::eq
//! ```
//!
//! Membership checks are linear. These are meant for small registries, not
//! as an alternative to [`IdList`](crate::IdList).

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// How a set decides that two elements are duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Equality {
    /// Only the same allocation is a duplicate.
    Identity,
    /// Equal values are duplicates.
    Value,
}

type EqFn<T> = fn(&Arc<T>, &Arc<T>) -> bool;

fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b)
}

fn equal<T: ?Sized + PartialEq>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

// ============================================================================
// ArraySet
// ============================================================================

/// Indexable set backed by a `Vec`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nexus_idlist::ArraySet;
///
/// let mut set: ArraySet<str> = ArraySet::by_value();
/// assert!(set.add(Arc::from("a")));
/// assert!(set.add(Arc::from("b")));
/// assert!(!set.add(Arc::from("a")));
/// assert_eq!(set.len(), 2);
/// ```
pub struct ArraySet<T: ?Sized> {
    items: Vec<Arc<T>>,
    equality: Equality,
    eq: EqFn<T>,
}

impl<T: ?Sized> ArraySet<T> {
    /// Creates an empty set comparing elements by identity.
    pub fn by_identity() -> Self {
        Self {
            items: Vec::new(),
            equality: Equality::Identity,
            eq: same,
        }
    }

    /// Sets the initial capacity.
    ///
    /// ```
    /// use nexus_idlist::ArraySet;
    ///
    /// let set: ArraySet<u32> = ArraySet::by_value().with_capacity(16);
    /// assert!(set.capacity() >= 16);
    /// ```
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.items.reserve(capacity);
        self
    }

    /// Returns the equality this set was built with.
    #[inline]
    pub fn equality(&self) -> Equality {
        self.equality
    }

    /// Elements the set can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Reserves room for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &Arc<T>) -> bool {
        self.position(value).is_some()
    }

    fn position(&self, value: &Arc<T>) -> Option<usize> {
        self.items.iter().position(|item| (self.eq)(item, value))
    }

    /// Appends `value` unless it is already present.
    pub fn add(&mut self, value: Arc<T>) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    /// Appends every element not already present. Returns `true` if any was
    /// added.
    pub fn add_all<I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        values
            .into_iter()
            .fold(false, |added, value| self.add(value) | added)
    }

    /// Inserts `value` at `index` unless it is already present.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: Arc<T>) -> bool {
        assert!(index <= self.items.len(), "insert index out of bounds");
        if self.contains(&value) {
            return false;
        }
        self.items.insert(index, value);
        true
    }

    /// Inserts every element not already present, in order, starting at
    /// `index`. Returns `true` if any was inserted.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_all<I>(&mut self, index: usize, values: I) -> bool
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        assert!(index <= self.items.len(), "insert index out of bounds");
        let mut at = index;
        for value in values {
            if !self.contains(&value) {
                self.items.insert(at, value);
                at += 1;
            }
        }
        at > index
    }

    /// Replaces the element at `index` unless `value` is already present.
    ///
    /// Returns the replaced element, or `None` if `value` was already a
    /// member and nothing changed.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&mut self, index: usize, value: Arc<T>) -> Option<Arc<T>> {
        assert!(index < self.items.len(), "set index out of bounds");
        if self.contains(&value) {
            return None;
        }
        Some(std::mem::replace(&mut self.items[index], value))
    }

    /// Removes the element equal to `value`.
    pub fn remove(&mut self, value: &Arc<T>) -> Option<Arc<T>> {
        let index = self.position(value)?;
        Some(self.items.remove(index))
    }

    /// Returns the element at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.items.get(index)
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.items.iter()
    }

    /// Elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Arc<T>] {
        &self.items
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: ?Sized + PartialEq> ArraySet<T> {
    /// Creates an empty set comparing elements by value.
    pub fn by_value() -> Self {
        Self {
            items: Vec::new(),
            equality: Equality::Value,
            eq: equal,
        }
    }
}

impl<T: ?Sized> Clone for ArraySet<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            equality: self.equality,
            eq: self.eq,
        }
    }
}

/// Equal when both use the same [`Equality`] and hold the same members,
/// in any order.
impl<T: ?Sized> PartialEq for ArraySet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equality == other.equality
            && self.len() == other.len()
            && other.iter().all(|value| self.contains(value))
    }
}

impl<T: ?Sized> Extend<Arc<T>> for ArraySet<T> {
    fn extend<I: IntoIterator<Item = Arc<T>>>(&mut self, values: I) {
        self.add_all(values);
    }
}

/// Collects into a set comparing by value.
impl<T: ?Sized + PartialEq> FromIterator<Arc<T>> for ArraySet<T> {
    fn from_iter<I: IntoIterator<Item = Arc<T>>>(values: I) -> Self {
        let mut set = Self::by_value();
        set.add_all(values);
        set
    }
}

impl<'a, T: ?Sized> IntoIterator for &'a ArraySet<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ArraySet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArraySet")
            .field("equality", &self.equality)
            .field("items", &self.items)
            .finish()
    }
}

// ============================================================================
// LinkedSet
// ============================================================================

/// Set open at both ends, backed by a `VecDeque`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nexus_idlist::LinkedSet;
///
/// let first = Arc::new(1);
/// let mut set = LinkedSet::by_identity();
/// assert!(set.add(Arc::clone(&first)));
/// assert!(set.add(Arc::new(1)));
/// assert!(!set.push_front(first));
/// assert_eq!(set.len(), 2);
/// ```
pub struct LinkedSet<T: ?Sized> {
    items: VecDeque<Arc<T>>,
    equality: Equality,
    eq: EqFn<T>,
}

impl<T: ?Sized> LinkedSet<T> {
    /// Creates an empty set comparing elements by identity.
    pub fn by_identity() -> Self {
        Self {
            items: VecDeque::new(),
            equality: Equality::Identity,
            eq: same,
        }
    }

    /// Sets the initial capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.items.reserve(capacity);
        self
    }

    /// Returns the equality this set was built with.
    #[inline]
    pub fn equality(&self) -> Equality {
        self.equality
    }

    /// Elements the set can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &Arc<T>) -> bool {
        self.items.iter().any(|item| (self.eq)(item, value))
    }

    /// Appends `value` at the back unless it is already present.
    pub fn add(&mut self, value: Arc<T>) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.items.push_back(value);
        true
    }

    /// Prepends `value` unless it is already present.
    pub fn push_front(&mut self, value: Arc<T>) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.items.push_front(value);
        true
    }

    /// Appends every element not already present. Returns `true` if any was
    /// added.
    pub fn add_all<I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        values
            .into_iter()
            .fold(false, |added, value| self.add(value) | added)
    }

    /// Removes the element equal to `value`.
    pub fn remove(&mut self, value: &Arc<T>) -> Option<Arc<T>> {
        let index = self.items.iter().position(|item| (self.eq)(item, value))?;
        self.items.remove(index)
    }

    /// Removes the front element.
    #[inline]
    pub fn pop_front(&mut self) -> Option<Arc<T>> {
        self.items.pop_front()
    }

    /// Removes the back element.
    #[inline]
    pub fn pop_back(&mut self) -> Option<Arc<T>> {
        self.items.pop_back()
    }

    /// Returns the front element.
    #[inline]
    pub fn front(&self) -> Option<&Arc<T>> {
        self.items.front()
    }

    /// Returns the back element.
    #[inline]
    pub fn back(&self) -> Option<&Arc<T>> {
        self.items.back()
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates elements front to back.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Arc<T>> {
        self.items.iter()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: ?Sized + PartialEq> LinkedSet<T> {
    /// Creates an empty set comparing elements by value.
    pub fn by_value() -> Self {
        Self {
            items: VecDeque::new(),
            equality: Equality::Value,
            eq: equal,
        }
    }
}

impl<T: ?Sized> Clone for LinkedSet<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            equality: self.equality,
            eq: self.eq,
        }
    }
}

/// Equal when both use the same [`Equality`] and hold the same members,
/// in any order.
impl<T: ?Sized> PartialEq for LinkedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equality == other.equality
            && self.len() == other.len()
            && other.iter().all(|value| self.contains(value))
    }
}

impl<T: ?Sized> Extend<Arc<T>> for LinkedSet<T> {
    fn extend<I: IntoIterator<Item = Arc<T>>>(&mut self, values: I) {
        self.add_all(values);
    }
}

/// Collects into a set comparing by value.
impl<T: ?Sized + PartialEq> FromIterator<Arc<T>> for LinkedSet<T> {
    fn from_iter<I: IntoIterator<Item = Arc<T>>>(values: I) -> Self {
        let mut set = Self::by_value();
        set.add_all(values);
        set
    }
}

impl<'a, T: ?Sized> IntoIterator for &'a LinkedSet<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::collections::vec_deque::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for LinkedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedSet")
            .field("equality", &self.equality)
            .field("items", &self.items)
            .finish()
    }
}
