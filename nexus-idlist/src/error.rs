//! Error type for list operations.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors reported by [`IdList`](crate::IdList) and [`Node`](crate::Node).
///
/// Only precondition violations are errors. Looking up or removing an
/// absent identifier returns `None`, and an observing node losing its value
/// is reported through [`Node::get_value`](crate::Node::get_value).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The node's value is unavailable, so it has no identifier to sort by.
    #[error("node has no value to take an identifier from")]
    Vacant,

    /// A node with the same identifier is already in the list.
    #[error("identifier {id} is already present in the list")]
    DuplicateId {
        /// The rejected identifier.
        id: i64,
    },

    /// The node already belongs to a list.
    #[error("node is already enrolled under identifier {id}")]
    AlreadyEnrolled {
        /// Identifier the node is enrolled under.
        id: i64,
    },

    /// A block size of zero was configured.
    #[error("block size must be at least 1")]
    InvalidBlockSize,

    /// Growing the quick-reference index failed. The list is unchanged.
    #[error("failed to grow the quick-reference index: {0}")]
    Reserve(#[from] TryReserveError),
}

/// Result alias for list operations.
pub type Result<T> = std::result::Result<T, Error>;
