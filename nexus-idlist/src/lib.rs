//! Sorted, identifier-indexed lists of shared nodes.
//!
//! An [`IdList`] keeps [`Node`]s in ascending order of a 64-bit identifier
//! supplied by each value ([`Identified`]). Lookup, insertion and removal
//! by identifier go through a sparse quick-reference index, so they cost a
//! binary search plus a short bounded walk instead of a full scan.
//!
//! # Design
//!
//! ```text
//! index:  [0] ───────────────► [1] ───────────────► [2]
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! chain:  n(10) ⇄ n(20) ⇄ n(30) ⇄ n(40) ⇄ n(50) ⇄ n(60) ⇄ n(70)
//! ```
//!
//! - **Chain**: doubly-linked, slab-backed, ascending by identifier
//! - **Index**: one slot for every `block_size`-th chain position
//! - **Nodes**: shared handles that survive removal and know their list
//!
//! # Ownership Modes
//!
//! Each node holds its value one of two ways, chosen at construction:
//!
//! | Mode | Constructor | Value lifetime |
//! |------|-------------|----------------|
//! | [`Mode::Owning`] | [`Node::owning`] | At least as long as the node |
//! | [`Mode::Observing`] | [`Node::observing`] | Owned elsewhere, may vanish |
//!
//! An observing node whose value is dropped stays in its list, sorted under
//! the identifier captured when it was added, and can still be removed with
//! [`Node::remove_from_list`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use nexus_idlist::{IdList, Identified, Node};
//!
//! struct Order {
//!     id: i64,
//! }
//!
//! impl Identified for Order {
//!     fn id(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! let list = IdList::new();
//! for id in [50, 10, 30, 20, 40] {
//!     list.add(&Node::owning(Order { id })).unwrap();
//! }
//! assert_eq!(list.ids(), vec![10, 20, 30, 40, 50]);
//!
//! list.remove(30);
//! list.add(&Node::owning(Order { id: 25 })).unwrap();
//! assert_eq!(list.ids(), vec![10, 20, 25, 40, 50]);
//!
//! // Observed values are owned by the caller
//! let order = Arc::new(Order { id: 60 });
//! list.add(&Node::observing(&order)).unwrap();
//! drop(order);
//! assert!(list.last().unwrap().get_value().is_none());
//! ```
//!
//! # Concurrency
//!
//! Every list operation takes `&self` and runs under one lock per list.
//! [`IdList`] and [`Node`] are `Send + Sync` when the value type is.
//!
//! # Also Included
//!
//! - [`ArraySet`] / [`LinkedSet`]: small duplicate-suppressing sets of `Arc`s
//! - [`Listeners`]: a thread-safe listener registry built on [`LinkedSet`]
//!
//! # Feature Flags
//!
//! - `serde` - `Serialize`/`Deserialize` for [`ListConfig`]

#![warn(missing_docs)]

mod chain;
mod key;

pub mod config;
pub mod error;
pub mod identified;
pub mod list;
pub mod listeners;
pub mod node;
pub mod set;

pub use config::{DEFAULT_BLOCK_SIZE, ListConfig};
pub use error::{Error, Result};
pub use identified::{Identified, VACANT_ID};
pub use list::IdList;
pub use listeners::Listeners;
pub use node::{Mode, Node};
pub use set::{ArraySet, Equality, LinkedSet};
