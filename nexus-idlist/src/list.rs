//! Thread-safe sorted list of identified nodes.
//!
//! # Design
//!
//! ```text
//! IdList ──Arc──► Shared { Mutex<Chain<Node<V>>> }
//!                   ▲                   │
//!                   │ Weak              │ arena entry holds a Node handle
//!                   │                   ▼
//!                 Node { payload, seat: Enrolled { owner, slot, id } }
//! ```
//!
//! The list handle is cheap to clone; clones share one chain. A node keeps
//! only a weak reference to its list, so dropping the last list handle
//! drops the chain, which detaches every node still in it.
//!
//! Every chain access happens under the list lock. Node seats are locked
//! after the list lock and only for the duration of a single read or write.
//! Moving a node from one list to another locks both, lower address first,
//! so the move either happens whole or not at all.
//!
//! # Example
//!
//! ```
//! use nexus_idlist::{IdList, Identified, Node};
//!
//! struct Order {
//!     id: i64,
//!     qty: u32,
//! }
//!
//! impl Identified for Order {
//!     fn id(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! let list = IdList::new();
//! for (id, qty) in [(50, 5), (10, 1), (30, 3)] {
//!     list.add(&Node::owning(Order { id, qty })).unwrap();
//! }
//!
//! assert_eq!(list.ids(), vec![10, 30, 50]);
//! assert_eq!(list.get(30).and_then(|n| n.get_value()).map(|o| o.qty), Some(3));
//!
//! let removed = list.remove(10).unwrap();
//! assert!(!removed.is_enrolled());
//! assert_eq!(list.first().map(|n| n.value_id()), Some(30));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::mem;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::chain::Chain;
use crate::config::ListConfig;
use crate::error::{Error, Result};
use crate::identified::Identified;
use crate::key::Slot;
use crate::node::{Node, Seat, bridge, relink};

/// Direction of a neighbour lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Back,
    Forward,
}

pub(crate) struct Shared<V> {
    chain: Mutex<Chain<Node<V>>>,
}

impl<V> Drop for Shared<V> {
    fn drop(&mut self) {
        for node in self.chain.get_mut().clear() {
            *node.inner().seat.lock() = Seat::detached();
        }
    }
}

/// Identifier `node` is enrolled under in `shared`, if it is enrolled there.
///
/// Call with `shared`'s chain locked for the answer to stay true.
fn enrolled_in<V>(node: &Node<V>, shared: &Arc<Shared<V>>) -> Option<i64> {
    match &*node.inner().seat.lock() {
        Seat::Enrolled { owner, id, .. } if Weak::as_ptr(owner) == Arc::as_ptr(shared) => Some(*id),
        _ => None,
    }
}

/// A sorted, identifier-indexed list of [`Node`]s.
///
/// Nodes are kept in ascending identifier order. A quick-reference index
/// over every [`block_size`](Self::block_size)-th node keeps lookups,
/// insertions and removals close to logarithmic.
///
/// All operations take `&self`; the list serializes them internally.
pub struct IdList<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for IdList<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> IdList<V> {
    #[inline]
    pub(crate) fn from_shared(shared: Arc<Shared<V>>) -> Self {
        Self { shared }
    }

    fn from_chain_parts(chain: Chain<Node<V>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                chain: Mutex::new(chain),
            }),
        }
    }

    /// Creates an empty list with the default block size.
    pub fn new() -> Self {
        let config = ListConfig::new();
        Self::from_chain_parts(Chain::new(config.block_size, config.capacity))
    }

    /// Creates an empty list from a configuration.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBlockSize`] if the block size is zero.
    pub fn with_config(config: ListConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_chain_parts(Chain::new(
            config.block_size,
            config.capacity,
        )))
    }

    /// Returns `true` if both handles refer to the same list.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Chain entries per quick-reference entry.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.shared.chain.lock().block_size()
    }

    /// Number of nodes in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.chain.lock().len()
    }

    /// Returns `true` if the list holds no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.chain.lock().is_empty()
    }

    /// Returns the node enrolled under `id`.
    pub fn get(&self, id: i64) -> Option<Node<V>> {
        self.shared.chain.lock().get(id).map(|entry| entry.value.clone())
    }

    /// Returns `true` if a node is enrolled under `id`.
    pub fn contains(&self, id: i64) -> bool {
        self.shared.chain.lock().find(id).is_some()
    }

    /// Returns the node with the lowest identifier.
    pub fn first(&self) -> Option<Node<V>> {
        self.shared.chain.lock().first().map(|entry| entry.value.clone())
    }

    /// Returns the node with the highest identifier.
    pub fn last(&self) -> Option<Node<V>> {
        self.shared.chain.lock().last().map(|entry| entry.value.clone())
    }

    /// Enrolled identifiers in ascending order.
    pub fn ids(&self) -> Vec<i64> {
        self.shared.chain.lock().iter().map(|(id, _)| id).collect()
    }

    /// Snapshot of the nodes in ascending order.
    pub fn nodes(&self) -> Vec<Node<V>> {
        self.shared
            .chain
            .lock()
            .iter()
            .map(|(_, node)| node.clone())
            .collect()
    }

    /// Identifiers of the quick-reference entries, in order.
    ///
    /// Entry `j` is the node at chain position `j * block_size`.
    pub fn index_ids(&self) -> Vec<i64> {
        self.shared.chain.lock().index_ids().collect()
    }

    /// Removes the node enrolled under `id`.
    ///
    /// The returned node is loose with no links and keeps its value.
    pub fn remove(&self, id: i64) -> Option<Node<V>> {
        let mut chain = self.shared.chain.lock();
        let entry = chain.remove(id)?;
        *entry.value.inner().seat.lock() = Seat::detached();
        trace!(id, len = chain.len(), "node detached");
        Some(entry.value)
    }

    /// Detaches every node, returning them in ascending order.
    pub fn clear(&self) -> Vec<Node<V>> {
        let mut chain = self.shared.chain.lock();
        let nodes = chain.clear();
        for node in &nodes {
            *node.inner().seat.lock() = Seat::detached();
        }
        trace!(count = nodes.len(), "list cleared");
        nodes
    }

    /// Removes `node` if it is still the entry under `id`.
    pub(crate) fn remove_node(&self, node: &Node<V>, id: i64) -> bool {
        let mut chain = self.shared.chain.lock();
        let lookup = chain.seek(id);
        if !lookup.found {
            return false;
        }
        let is_node = chain
            .get_slot(lookup.slot)
            .is_some_and(|entry| entry.value.ptr_eq(node));
        if !is_node {
            return false;
        }

        let entry = chain.remove_at(lookup);
        *entry.value.inner().seat.lock() = Seat::detached();
        trace!(id, len = chain.len(), "node detached");
        true
    }

    #[inline]
    fn enrolled_seat(&self, slot: Slot, id: i64) -> Seat<V> {
        Seat::Enrolled {
            owner: Arc::downgrade(&self.shared),
            slot,
            id,
        }
    }

    /// Neighbour of an enrolled `node` in this list's chain.
    pub(crate) fn neighbor(&self, node: &Node<V>, step: Step) -> Option<Node<V>> {
        let chain = self.shared.chain.lock();
        let slot = match &*node.inner().seat.lock() {
            Seat::Enrolled { owner, slot, .. }
                if Weak::as_ptr(owner) == Arc::as_ptr(&self.shared) =>
            {
                *slot
            }
            _ => return None,
        };
        debug_assert!(
            chain
                .get_slot(slot)
                .is_some_and(|entry| entry.value.ptr_eq(node))
        );

        let target = match step {
            Step::Back => chain.prev_slot(slot),
            Step::Forward => chain.next_slot(slot),
        };
        chain.get_slot(target).map(|entry| entry.value.clone())
    }
}

impl<V: Identified> IdList<V> {
    /// Builds a list from every node of the loose chain `node` belongs to.
    ///
    /// The loose links are dissolved; each node is enrolled at its sorted
    /// position.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyEnrolled`] if `node` is in a list.
    /// - [`Error::Vacant`] if any node has no value.
    /// - [`Error::DuplicateId`] if two nodes share an identifier.
    ///
    /// On error the loose chain is left linked in its original order.
    pub fn from_chain(node: &Node<V>) -> Result<Self> {
        if let Some(id) = node.enrolled_id() {
            return Err(Error::AlreadyEnrolled { id });
        }

        let mut head = node.clone();
        while let Some(prev) = head.prev() {
            head = prev;
        }

        let mut members = Vec::new();
        let mut current = Some(head);
        while let Some(node) = current {
            current = node.next();
            members.push(node);
        }

        let mut seen = HashSet::with_capacity(members.len());
        for member in &members {
            let id = member.get_value().ok_or(Error::Vacant)?.id();
            if !seen.insert(id) {
                return Err(Error::DuplicateId { id });
            }
        }

        let config = ListConfig::new().capacity(members.len());
        let list = Self::with_config(config)?;
        for member in &members {
            if let Err(err) = list.add(member) {
                list.clear();
                relink(&members);
                return Err(err);
            }
        }
        Ok(list)
    }

    /// Enrols `node` at its sorted position.
    ///
    /// The node is taken out of any loose chain it was part of. Its current
    /// value's identifier is captured and used for ordering until the node
    /// is removed.
    ///
    /// # Errors
    ///
    /// - [`Error::Vacant`] if the node has no value.
    /// - [`Error::AlreadyEnrolled`] if the node is in a list.
    /// - [`Error::DuplicateId`] if the identifier is taken.
    /// - [`Error::Reserve`] if the index could not grow.
    ///
    /// The list and the node are unchanged on error.
    pub fn add(&self, node: &Node<V>) -> Result<()> {
        let id = node.get_value().ok_or(Error::Vacant)?.id();

        let mut chain = self.shared.chain.lock();
        let mut seat = node.inner().seat.lock();
        if let Seat::Enrolled { id, .. } = &*seat {
            return Err(Error::AlreadyEnrolled { id: *id });
        }

        let slot = chain.insert(node.clone(), id)?;
        let loose = mem::replace(&mut *seat, self.enrolled_seat(slot, id));
        drop(seat);
        trace!(id, len = chain.len(), "node enrolled");
        drop(chain);

        // Former neighbours may be released here, outside the list lock
        if let Seat::Loose { prev, next } = loose {
            bridge(prev, next);
        }
        Ok(())
    }

    /// Moves `node` here from wherever it is, placing it by the identifier
    /// of its current value.
    ///
    /// All or nothing: on error the node is still enrolled where it was, or
    /// still linked into its loose chain.
    pub(crate) fn adopt(&self, node: &Node<V>) -> Result<()> {
        let id = node.get_value().ok_or(Error::Vacant)?.id();
        let source = match &*node.inner().seat.lock() {
            Seat::Enrolled { owner, .. } => owner.upgrade(),
            Seat::Loose { .. } => None,
        };

        match source {
            Some(source) if Arc::ptr_eq(&source, &self.shared) => self.reposition(node, id),
            Some(source) => self.transfer(&source, node, id),
            None => self.add(node),
        }
    }

    /// Re-sorts a node already in this list under a new identifier.
    fn reposition(&self, node: &Node<V>, id: i64) -> Result<()> {
        let mut chain = self.shared.chain.lock();
        let Some(from) = enrolled_in(node, &self.shared) else {
            drop(chain);
            return self.add(node);
        };
        if from == id {
            return Ok(());
        }

        // Insert before removing so a failed insert leaves the old entry
        let slot = chain.insert(node.clone(), id)?;
        let stale = chain.remove(from);
        debug_assert!(stale.is_some_and(|entry| entry.value.ptr_eq(node)));
        *node.inner().seat.lock() = self.enrolled_seat(slot, id);
        trace!(from, id, "node repositioned");
        Ok(())
    }

    /// Moves a node enrolled in `source` into this list.
    fn transfer(&self, source: &Arc<Shared<V>>, node: &Node<V>, id: i64) -> Result<()> {
        // Two lists are always locked in address order
        let (mut source_chain, mut target_chain) =
            if Arc::as_ptr(source) < Arc::as_ptr(&self.shared) {
                let source_chain = source.chain.lock();
                (source_chain, self.shared.chain.lock())
            } else {
                let target_chain = self.shared.chain.lock();
                (source.chain.lock(), target_chain)
            };

        let Some(from) = enrolled_in(node, source) else {
            drop(target_chain);
            drop(source_chain);
            return self.add(node);
        };

        let slot = target_chain.insert(node.clone(), id)?;
        let stale = source_chain.remove(from);
        debug_assert!(stale.is_some_and(|entry| entry.value.ptr_eq(node)));
        *node.inner().seat.lock() = self.enrolled_seat(slot, id);
        trace!(from, id, len = target_chain.len(), "node transferred");
        Ok(())
    }
}

impl<V> Default for IdList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for IdList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.shared.chain.lock();
        f.debug_struct("IdList")
            .field("len", &chain.len())
            .field("block_size", &chain.block_size())
            .field("blocks", &chain.blocks())
            .finish()
    }
}

#[cfg(test)]
impl<V> IdList<V> {
    pub(crate) fn assert_invariants(&self) {
        let chain = self.shared.chain.lock();
        chain.assert_invariants();
        for (id, node) in chain.iter() {
            match &*node.inner().seat.lock() {
                Seat::Enrolled {
                    owner, id: seat_id, ..
                } => {
                    assert_eq!(*seat_id, id, "seat id disagrees with chain");
                    assert_eq!(Weak::as_ptr(owner), Arc::as_ptr(&self.shared));
                }
                Seat::Loose { .. } => panic!("node {id} in chain but seat is loose"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mode;

    #[derive(Debug, PartialEq)]
    struct Item(i64);

    impl Identified for Item {
        fn id(&self) -> i64 {
            self.0
        }
    }

    fn list_of(block_size: usize, ids: &[i64]) -> IdList<Item> {
        let list = IdList::with_config(ListConfig::new().block_size(block_size)).unwrap();
        for &id in ids {
            list.add(&Node::owning(Item(id))).unwrap();
            list.assert_invariants();
        }
        list
    }

    #[test]
    fn new_list_is_empty() {
        let list: IdList<Item> = IdList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.block_size(), crate::DEFAULT_BLOCK_SIZE);
        assert!(list.first().is_none());
        assert!(list.last().is_none());
        assert!(list.get(1).is_none());
        assert!(list.remove(1).is_none());
    }

    #[test]
    fn zero_block_size_rejected() {
        let result = IdList::<Item>::with_config(ListConfig::new().block_size(0));
        assert!(matches!(result, Err(Error::InvalidBlockSize)));
    }

    #[test]
    fn add_enrols_node() {
        let list: IdList<Item> = IdList::new();
        let node = Node::owning(Item(7));
        list.add(&node).unwrap();

        assert!(node.is_enrolled());
        assert_eq!(node.enrolled_id(), Some(7));
        assert!(node.owner().unwrap().ptr_eq(&list));
        assert!(list.get(7).unwrap().ptr_eq(&node));
        assert!(list.contains(7));
    }

    #[test]
    fn add_twice_rejected() {
        let list = list_of(3, &[1]);
        let other: IdList<Item> = IdList::new();
        let node = list.get(1).unwrap();

        assert_eq!(list.add(&node), Err(Error::AlreadyEnrolled { id: 1 }));
        assert_eq!(other.add(&node), Err(Error::AlreadyEnrolled { id: 1 }));
        assert!(other.is_empty());
        assert!(node.owner().unwrap().ptr_eq(&list));
    }

    #[test]
    fn duplicate_rejected() {
        let list = list_of(3, &[1, 2, 3]);
        let node = Node::owning(Item(2));
        assert_eq!(list.add(&node), Err(Error::DuplicateId { id: 2 }));
        assert!(!node.is_enrolled());
        assert_eq!(list.len(), 3);
        list.assert_invariants();
    }

    #[test]
    fn vacant_rejected() {
        let list: IdList<Item> = IdList::new();
        let value = Arc::new(Item(4));
        let node = Node::observing(&value);
        drop(value);

        assert_eq!(list.add(&node), Err(Error::Vacant));
        assert!(list.is_empty());
    }

    #[test]
    fn remove_detaches() {
        let list = list_of(2, &[1, 2, 3]);
        let node = list.remove(2).unwrap();
        list.assert_invariants();

        assert!(!node.is_enrolled());
        assert!(node.owner().is_none());
        assert!(node.prev().is_none());
        assert!(node.next().is_none());
        assert_eq!(node.value_id(), 2);
        assert_eq!(list.ids(), vec![1, 3]);

        // Detached nodes can be enrolled again
        list.add(&node).unwrap();
        assert_eq!(list.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn neighbours_follow_chain() {
        let list = list_of(2, &[30, 10, 20]);
        let middle = list.get(20).unwrap();
        assert_eq!(middle.prev().map(|n| n.value_id()), Some(10));
        assert_eq!(middle.next().map(|n| n.value_id()), Some(30));
        assert!(list.first().unwrap().prev().is_none());
        assert!(list.last().unwrap().next().is_none());
    }

    #[test]
    fn remove_from_list_uses_enrolled_id() {
        let list = list_of(3, &[1, 3]);
        let value = Arc::new(Item(2));
        let node = Node::observing(&value);
        list.add(&node).unwrap();

        drop(value);
        assert!(node.get_value().is_none());
        assert_eq!(node.value_id(), crate::VACANT_ID);
        assert_eq!(node.mode(), Mode::Observing);
        assert_eq!(list.ids(), vec![1, 2, 3]);

        assert!(node.remove_from_list());
        assert!(!node.remove_from_list());
        assert_eq!(list.ids(), vec![1, 3]);
        list.assert_invariants();
    }

    #[test]
    fn insert_ahead_of_enrolled_adds_sorted() {
        let list = list_of(3, &[10, 30]);
        let anchor = list.get(30).unwrap();

        let node = Node::owning(Item(20));
        node.insert_ahead(&anchor).unwrap();
        assert!(node.owner().unwrap().ptr_eq(&list));
        assert_eq!(list.ids(), vec![10, 20, 30]);

        // Sorted position wins over the requested neighbour
        let high = Node::owning(Item(40));
        high.insert_ahead(&list.get(10).unwrap()).unwrap();
        assert_eq!(list.ids(), vec![10, 20, 30, 40]);
        list.assert_invariants();
    }

    #[test]
    fn insert_ahead_moves_between_lists() {
        let from = list_of(3, &[1, 2]);
        let to = list_of(3, &[5]);
        let node = from.get(2).unwrap();

        node.insert_ahead(&to.get(5).unwrap()).unwrap();
        assert_eq!(from.ids(), vec![1]);
        assert_eq!(to.ids(), vec![2, 5]);
        assert!(node.owner().unwrap().ptr_eq(&to));
    }

    #[test]
    fn insert_ahead_duplicate_keeps_loose_links() {
        let list = list_of(3, &[1]);
        let node = Node::owning(Item(1));
        let tail = Node::owning(Item(5));
        node.insert_ahead(&tail).unwrap();

        assert_eq!(
            node.insert_ahead(&list.get(1).unwrap()),
            Err(Error::DuplicateId { id: 1 })
        );
        assert!(!node.is_enrolled());
        assert!(node.next().unwrap().ptr_eq(&tail));
        assert!(tail.prev().unwrap().ptr_eq(&node));
    }

    #[test]
    fn insert_ahead_duplicate_keeps_source_list() {
        let from = list_of(3, &[1, 2]);
        let to = list_of(3, &[2, 5]);
        let node = from.get(2).unwrap();

        assert_eq!(
            node.insert_ahead(&to.get(5).unwrap()),
            Err(Error::DuplicateId { id: 2 })
        );
        assert_eq!(from.ids(), vec![1, 2]);
        assert_eq!(to.ids(), vec![2, 5]);
        assert!(from.get(2).unwrap().ptr_eq(&node));
        assert!(node.owner().unwrap().ptr_eq(&from));
        assert_eq!(node.prev().map(|n| n.value_id()), Some(1));
        from.assert_invariants();
        to.assert_invariants();
    }

    #[test]
    fn insert_ahead_vacant_keeps_source_list() {
        let from = list_of(3, &[1]);
        let to = list_of(3, &[5]);
        let value = Arc::new(Item(3));
        let node = Node::observing(&value);
        from.add(&node).unwrap();
        drop(value);

        assert_eq!(node.insert_ahead(&to.get(5).unwrap()), Err(Error::Vacant));
        assert_eq!(from.ids(), vec![1, 3]);
        assert_eq!(node.enrolled_id(), Some(3));
        assert_eq!(to.ids(), vec![5]);
    }

    #[test]
    fn insert_ahead_within_list_resorts() {
        let list = list_of(2, &[1, 2, 3]);
        let node = list.get(2).unwrap();

        // Same identifier: already in place
        node.insert_ahead(&list.get(3).unwrap()).unwrap();
        assert_eq!(list.ids(), vec![1, 2, 3]);

        node.set_value(Arc::new(Item(3)));
        assert_eq!(
            node.insert_ahead(&list.get(1).unwrap()),
            Err(Error::DuplicateId { id: 3 })
        );
        assert_eq!(list.ids(), vec![1, 2, 3]);
        assert_eq!(node.enrolled_id(), Some(2));

        node.set_value(Arc::new(Item(9)));
        node.insert_ahead(&list.get(1).unwrap()).unwrap();
        assert_eq!(list.ids(), vec![1, 3, 9]);
        assert_eq!(node.enrolled_id(), Some(9));
        assert!(list.last().unwrap().ptr_eq(&node));
        list.assert_invariants();
    }

    #[test]
    fn add_dissolves_loose_chain() {
        let a = Node::owning(Item(1));
        let b = Node::owning(Item(2));
        let c = Node::owning(Item(3));
        b.insert_ahead(&c).unwrap();
        a.insert_ahead(&b).unwrap();

        let list: IdList<Item> = IdList::new();
        list.add(&b).unwrap();

        assert!(a.next().unwrap().ptr_eq(&c));
        assert!(c.prev().unwrap().ptr_eq(&a));
        assert!(b.prev().is_none());
        assert!(b.next().is_none());
    }

    #[test]
    fn from_chain_enrols_every_member() {
        let c = Node::owning(Item(30));
        let a = Node::owning(Item(10));
        let b = Node::owning(Item(20));
        // Loose order need not be sorted
        a.insert_ahead(&c).unwrap();
        c.remove_from_list();
        c.insert_ahead(&a).unwrap();
        b.insert_ahead(&a).unwrap();

        let list = IdList::from_chain(&a).unwrap();
        list.assert_invariants();
        assert_eq!(list.ids(), vec![10, 20, 30]);
        for node in [&a, &b, &c] {
            assert!(node.owner().unwrap().ptr_eq(&list));
        }
    }

    #[test]
    fn from_chain_duplicate_changes_nothing() {
        let a = Node::owning(Item(1));
        let b = Node::owning(Item(1));
        a.insert_ahead(&b).unwrap();

        assert!(matches!(
            IdList::from_chain(&b),
            Err(Error::DuplicateId { id: 1 })
        ));
        assert!(a.next().unwrap().ptr_eq(&b));
        assert!(!a.is_enrolled());
    }

    #[test]
    fn from_chain_rejects_enrolled() {
        let list = list_of(3, &[4]);
        let node = list.get(4).unwrap();
        assert!(matches!(
            IdList::from_chain(&node),
            Err(Error::AlreadyEnrolled { id: 4 })
        ));
    }

    #[test]
    fn clear_detaches_all() {
        let list = list_of(2, &[3, 1, 2]);
        let nodes = list.clear();
        assert_eq!(
            nodes.iter().map(Node::value_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(nodes.iter().all(|n| !n.is_enrolled()));
        assert!(list.is_empty());
        list.assert_invariants();
    }

    #[test]
    fn dropping_list_detaches_nodes() {
        let list = list_of(2, &[1, 2]);
        let node = list.get(1).unwrap();
        drop(list);

        assert!(!node.is_enrolled());
        assert!(node.owner().is_none());
        assert!(node.next().is_none());
        assert_eq!(node.value_id(), 1);
    }

    #[test]
    fn clones_share_list() {
        let list = list_of(3, &[1]);
        let clone = list.clone();
        clone.add(&Node::owning(Item(2))).unwrap();
        assert!(list.ptr_eq(&clone));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn set_value_keeps_position() {
        let list = list_of(3, &[1, 2, 3]);
        let node = list.get(2).unwrap();
        let previous = node.set_value(Arc::new(Item(2)));
        assert_eq!(previous.as_deref(), Some(&Item(2)));

        // Identifier drift is logged; the list keeps the enrolled id
        node.set_value(Arc::new(Item(99)));
        assert_eq!(node.enrolled_id(), Some(2));
        assert!(list.get(2).unwrap().ptr_eq(&node));
        assert!(list.get(99).is_none());
        assert!(node.remove_from_list());
        list.assert_invariants();
    }

    #[test]
    fn debug_output() {
        let list = list_of(4, &[1, 2, 3, 4, 5]);
        let debug = format!("{list:?}");
        assert!(debug.contains("len: 5"));
        assert!(debug.contains("blocks: 2"));
    }
}

#[cfg(test)]
mod bench_id_list {
    use super::*;
    use hdrhistogram::Histogram;

    struct Tick(i64);

    impl Identified for Tick {
        fn id(&self) -> i64 {
            self.0
        }
    }

    #[inline]
    fn rdtscp() -> u64 {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::x86_64::__rdtscp(&mut 0)
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            std::time::Instant::now().elapsed().as_nanos() as u64
        }
    }

    fn print_histogram(name: &str, hist: &Histogram<u64>) {
        println!(
            "{:24} p50: {:4} cycles | p99: {:4} cycles | p999: {:5} cycles | min: {:4} | max: {:5}",
            name,
            hist.value_at_quantile(0.50),
            hist.value_at_quantile(0.99),
            hist.value_at_quantile(0.999),
            hist.min(),
            hist.max(),
        );
    }

    const WARMUP: usize = 10_000;
    const ITERATIONS: usize = 100_000;
    const POPULATION: i64 = 10_000;

    fn populated() -> IdList<Tick> {
        let list = IdList::with_config(ListConfig::new().capacity(POPULATION as usize + 1)).unwrap();
        for id in 0..POPULATION {
            list.add(&Node::owning(Tick(id * 2))).unwrap();
        }
        list
    }

    #[test]
    #[ignore]
    fn bench_add_remove_middle() {
        let list = populated();
        let mut hist = Histogram::<u64>::new(3).unwrap();
        let node = Node::owning(Tick(POPULATION + 1));

        for _ in 0..WARMUP {
            let _ = list.add(&node);
            let _ = list.remove(POPULATION + 1);
        }

        for _ in 0..ITERATIONS {
            let start = rdtscp();
            let _ = list.add(&node);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
            let _ = list.remove(POPULATION + 1);
        }

        print_histogram("add (middle)", &hist);
    }

    #[test]
    #[ignore]
    fn bench_remove_middle() {
        let list = populated();
        let mut hist = Histogram::<u64>::new(3).unwrap();
        let node = Node::owning(Tick(POPULATION + 1));

        for _ in 0..WARMUP {
            let _ = list.add(&node);
            let _ = list.remove(POPULATION + 1);
        }

        for _ in 0..ITERATIONS {
            let _ = list.add(&node);
            let start = rdtscp();
            let _ = list.remove(POPULATION + 1);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
        }

        print_histogram("remove (middle)", &hist);
    }

    #[test]
    #[ignore]
    fn bench_get() {
        let list = populated();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            let _ = list.get((i as i64 % POPULATION) * 2);
        }

        for i in 0..ITERATIONS {
            let id = (i as i64 * 7 % POPULATION) * 2;
            let start = rdtscp();
            let _ = list.get(id);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
        }

        print_histogram("get", &hist);
    }

    #[test]
    #[ignore]
    fn bench_first_last() {
        let list = populated();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for _ in 0..WARMUP {
            let _ = list.first();
            let _ = list.last();
        }

        for _ in 0..ITERATIONS {
            let start = rdtscp();
            let _ = list.first();
            let _ = list.last();
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
        }

        print_histogram("first + last", &hist);
    }
}
