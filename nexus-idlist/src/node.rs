//! List nodes: a value under an ownership mode, plus membership.
//!
//! A [`Node`] is a cheaply clonable handle. Clones refer to the same node;
//! identity is the allocation, not the value.
//!
//! # Ownership Modes
//!
//! ```text
//! Owning     node ──strong──► value     value lives as long as the node
//! Observing  node ──weak────► value     value owned elsewhere, may vanish
//! ```
//!
//! The mode is fixed at construction.
//!
//! # Membership
//!
//! A node is either *loose* or *enrolled*:
//!
//! ```text
//! Loose      prev/next link to other loose nodes (or nothing)
//! Enrolled   weak back-reference to one IdList, plus its arena slot and
//!            the identifier it was enrolled under; the chain links live
//!            in the list's arena
//! ```
//!
//! Loose links are strong both ways, so any member a caller still holds
//! keeps its whole chain. Each node counts its live [`Node`] handles; when
//! no member of a chain has one left, the chain is cut apart and freed.
//!
//! Enrolment and detachment only happen under the owning list's lock. The
//! node's own fields sit behind short, uncontended locks held for a single
//! field access; lock order is always list first, node second.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::error::Result;
use crate::identified::{Identified, VACANT_ID};
use crate::key::Slot;
use crate::list::{IdList, Shared, Step};

/// How a node holds its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The node keeps its value alive.
    Owning,
    /// The node observes a value owned elsewhere.
    Observing,
}

enum Payload<V> {
    Owning(Arc<V>),
    Observing(Weak<V>),
}

impl<V> Payload<V> {
    #[inline]
    fn mode(&self) -> Mode {
        match self {
            Payload::Owning(_) => Mode::Owning,
            Payload::Observing(_) => Mode::Observing,
        }
    }

    #[inline]
    fn get(&self) -> Option<Arc<V>> {
        match self {
            Payload::Owning(value) => Some(Arc::clone(value)),
            Payload::Observing(value) => value.upgrade(),
        }
    }

    fn replace(&mut self, value: Arc<V>) -> Option<Arc<V>> {
        match self {
            Payload::Owning(current) => Some(mem::replace(current, value)),
            Payload::Observing(current) => mem::replace(current, Arc::downgrade(&value)).upgrade(),
        }
    }
}

pub(crate) enum Seat<V> {
    Loose {
        prev: Option<Arc<NodeInner<V>>>,
        next: Option<Arc<NodeInner<V>>>,
    },
    Enrolled {
        owner: Weak<Shared<V>>,
        slot: Slot,
        id: i64,
    },
}

impl<V> Seat<V> {
    /// Loose with no links.
    pub(crate) const fn detached() -> Self {
        Seat::Loose {
            prev: None,
            next: None,
        }
    }

    #[inline]
    fn link(&self, step: Step) -> Option<Arc<NodeInner<V>>> {
        match (self, step) {
            (Seat::Loose { prev, .. }, Step::Back) => prev.clone(),
            (Seat::Loose { next, .. }, Step::Forward) => next.clone(),
            (Seat::Enrolled { .. }, _) => None,
        }
    }
}

pub(crate) struct NodeInner<V> {
    payload: Mutex<Payload<V>>,
    pub(crate) seat: Mutex<Seat<V>>,
    /// Live [`Node`] handles. Loose links are plain `Arc`s and don't count.
    handles: AtomicUsize,
}

/// Relinks the loose neighbours of a node that just left their chain.
pub(crate) fn bridge<V>(prev: Option<Arc<NodeInner<V>>>, next: Option<Arc<NodeInner<V>>>) {
    if let Some(next) = &next {
        if let Seat::Loose { prev: back, .. } = &mut *next.seat.lock() {
            *back = prev.clone();
        }
    }
    if let Some(prev) = &prev {
        if let Seat::Loose { next: forward, .. } = &mut *prev.seat.lock() {
            *forward = next.clone();
        }
    }
    if let Some(survivor) = prev.or(next) {
        release_unreachable(&survivor);
    }
}

/// Dissolves the loose chain around `start` once no member has a handle.
///
/// Loose links hold both neighbours strongly, so a chain keeps itself alive
/// as long as any member is reachable. When the last handle goes, the links
/// are cut and the members drop one at a time.
fn release_unreachable<V>(start: &Arc<NodeInner<V>>) {
    if start.handles.load(Ordering::SeqCst) > 0 {
        return;
    }

    let mut members = vec![Arc::clone(start)];
    for step in [Step::Back, Step::Forward] {
        let mut current = Arc::clone(start);
        loop {
            let link = current.seat.lock().link(step);
            let Some(link) = link else { break };
            if link.handles.load(Ordering::SeqCst) > 0 {
                return;
            }
            members.push(Arc::clone(&link));
            current = link;
        }
    }
    if members.len() == 1 {
        return;
    }

    for member in &members {
        let mut seat = member.seat.lock();
        if let Seat::Loose { .. } = &*seat {
            *seat = Seat::detached();
        }
    }
    trace!(count = members.len(), "unreachable loose chain released");
}

/// Rebuilds a loose chain in the order given. Enrolled members are skipped.
pub(crate) fn relink<V>(members: &[Node<V>]) {
    let mut loose = Vec::with_capacity(members.len());
    for member in members {
        if !member.is_enrolled() {
            member.unsplice();
            loose.push(member);
        }
    }
    for pair in loose.windows(2).rev() {
        pair[0].splice_before(pair[1]);
    }
}

/// A handle to a list node.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nexus_idlist::{IdList, Identified, Node};
///
/// #[derive(Debug)]
/// struct Session {
///     id: i64,
/// }
///
/// impl Identified for Session {
///     fn id(&self) -> i64 {
///         self.id
///     }
/// }
///
/// let list: IdList<Session> = IdList::new();
///
/// // Owned by the node
/// let owned = Node::owning(Session { id: 1 });
/// list.add(&owned).unwrap();
///
/// // Owned by the caller, observed by the node
/// let session = Arc::new(Session { id: 2 });
/// let observed = Node::observing(&session);
/// list.add(&observed).unwrap();
///
/// drop(session);
/// assert!(observed.get_value().is_none());
/// assert_eq!(observed.enrolled_id(), Some(2));
/// assert!(observed.remove_from_list());
/// assert_eq!(list.len(), 1);
/// ```
pub struct Node<V> {
    inner: Arc<NodeInner<V>>,
}

impl<V> Clone for Node<V> {
    fn clone(&self) -> Self {
        Self::from_inner(Arc::clone(&self.inner))
    }
}

impl<V> Drop for Node<V> {
    fn drop(&mut self) {
        if self.inner.handles.fetch_sub(1, Ordering::SeqCst) == 1 {
            release_unreachable(&self.inner);
        }
    }
}

impl<V> Node<V> {
    fn from_payload(payload: Payload<V>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                payload: Mutex::new(payload),
                seat: Mutex::new(Seat::detached()),
                handles: AtomicUsize::new(1),
            }),
        }
    }

    #[inline]
    pub(crate) fn from_inner(inner: Arc<NodeInner<V>>) -> Self {
        // A new handle is only made from an existing one or from a list
        inner.handles.fetch_add(1, Ordering::Relaxed);
        Self { inner }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &Arc<NodeInner<V>> {
        &self.inner
    }

    /// Creates a loose node that owns `value`.
    pub fn owning(value: V) -> Self {
        Self::owning_arc(Arc::new(value))
    }

    /// Creates a loose node that keeps an already shared `value` alive.
    pub fn owning_arc(value: Arc<V>) -> Self {
        Self::from_payload(Payload::Owning(value))
    }

    /// Creates a loose node that observes `value` without keeping it alive.
    pub fn observing(value: &Arc<V>) -> Self {
        Self::from_payload(Payload::Observing(Arc::downgrade(value)))
    }

    /// Returns the ownership mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.inner.payload.lock().mode()
    }

    /// Returns the value, or `None` if an observed value has been dropped.
    #[inline]
    pub fn get_value(&self) -> Option<Arc<V>> {
        self.inner.payload.lock().get()
    }

    /// Returns `true` if both handles refer to the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the identifier the node was enrolled under, if enrolled.
    ///
    /// This survives the value: an observing node whose value has been
    /// dropped still reports the identifier it is sorted by.
    pub fn enrolled_id(&self) -> Option<i64> {
        match &*self.inner.seat.lock() {
            Seat::Enrolled { id, .. } => Some(*id),
            Seat::Loose { .. } => None,
        }
    }

    /// Returns `true` if the node is linked into a list.
    #[inline]
    pub fn is_enrolled(&self) -> bool {
        self.enrolled_id().is_some()
    }

    /// Returns the list this node is enrolled in.
    pub fn owner(&self) -> Option<IdList<V>> {
        match &*self.inner.seat.lock() {
            Seat::Enrolled { owner, .. } => owner.upgrade().map(IdList::from_shared),
            Seat::Loose { .. } => None,
        }
    }

    /// Returns the previous node in the list, or in the loose chain.
    pub fn prev(&self) -> Option<Self> {
        self.step(Step::Back)
    }

    /// Returns the next node in the list, or in the loose chain.
    pub fn next(&self) -> Option<Self> {
        self.step(Step::Forward)
    }

    fn step(&self, step: Step) -> Option<Self> {
        let owner = match &*self.inner.seat.lock() {
            seat @ Seat::Loose { .. } => return seat.link(step).map(Self::from_inner),
            Seat::Enrolled { owner, .. } => owner.upgrade(),
        };
        IdList::from_shared(owner?).neighbor(self, step)
    }

    /// Unlinks the node from its loose chain. Returns `true` if it had links.
    fn unsplice(&self) -> bool {
        let (prev, next) = match &mut *self.inner.seat.lock() {
            Seat::Loose { prev, next } => (prev.take(), next.take()),
            Seat::Enrolled { .. } => return false,
        };
        let linked = prev.is_some() || next.is_some();
        bridge(prev, next);
        linked
    }

    /// Links this unlinked, loose node immediately before the loose `of`.
    fn splice_before(&self, of: &Self) {
        let prev = match &mut *of.inner.seat.lock() {
            Seat::Loose { prev, .. } => mem::replace(prev, Some(Arc::clone(&self.inner))),
            Seat::Enrolled { .. } => return,
        };

        *self.inner.seat.lock() = Seat::Loose {
            prev: prev.clone(),
            next: Some(Arc::clone(&of.inner)),
        };

        if let Some(prev) = prev {
            if let Seat::Loose { next, .. } = &mut *prev.seat.lock() {
                *next = Some(Arc::clone(&self.inner));
            }
        }
    }
}

impl<V: Identified> Node<V> {
    /// Replaces the value in place, keeping the ownership mode.
    ///
    /// Returns the previous value if it is still alive. Links are untouched.
    /// An enrolled node stays where it is: replacing the value with one of a
    /// different identifier breaks the caller contract and is logged.
    pub fn set_value(&self, value: Arc<V>) -> Option<Arc<V>> {
        let value_id = value.id();
        let previous = self.inner.payload.lock().replace(value);

        if let Some(enrolled_id) = self.enrolled_id() {
            if enrolled_id != value_id {
                warn!(
                    enrolled_id,
                    value_id, "node value replaced with a different identifier, list order unchanged"
                );
            }
        }

        previous
    }

    /// Returns the identifier of the current value, or [`VACANT_ID`] if the
    /// value is unavailable.
    #[inline]
    pub fn value_id(&self) -> i64 {
        self.get_value().map_or(VACANT_ID, |value| value.id())
    }

    /// Moves this node to sit immediately before `of`.
    ///
    /// If `of` is enrolled, this node leaves wherever it is and joins the
    /// same list, which places it by identifier. If `of` is loose, this
    /// node is spliced into `of`'s loose chain directly before it.
    ///
    /// A loose chain stays alive while any of its members has a handle, so
    /// holding just one node of a chain is enough to keep all of it.
    ///
    /// # Errors
    ///
    /// Only when `of` is enrolled: the errors of [`IdList::add`], except
    /// that an enrolled node is moved rather than rejected. The node is then
    /// left where it was, in its list or its loose chain.
    pub fn insert_ahead(&self, of: &Self) -> Result<()> {
        if self.ptr_eq(of) {
            return Ok(());
        }

        match of.owner() {
            Some(list) => list.adopt(self),
            None => {
                self.remove_from_list();
                self.splice_before(of);
                Ok(())
            }
        }
    }

    /// Takes the node out of its list or loose chain.
    ///
    /// An enrolled node is removed by the identifier it was enrolled under,
    /// so this works after an observed value has been dropped. Returns
    /// `true` if the node was unlinked, `false` if it had no links.
    pub fn remove_from_list(&self) -> bool {
        let enrolled = match &*self.inner.seat.lock() {
            Seat::Enrolled { owner, id, .. } => Some((owner.upgrade(), *id)),
            Seat::Loose { .. } => None,
        };

        match enrolled {
            Some((Some(owner), id)) => IdList::from_shared(owner).remove_node(self, id),
            Some((None, _)) => {
                *self.inner.seat.lock() = Seat::detached();
                false
            }
            None => self.unsplice(),
        }
    }
}

impl<V: Identified> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("mode", &self.mode())
            .field("value_id", &self.value_id())
            .field("enrolled_id", &self.enrolled_id())
            .finish()
    }
}
