//! List configuration.

use crate::error::{Error, Result};

/// Default number of chain entries covered by one quick-reference entry.
pub const DEFAULT_BLOCK_SIZE: usize = 15;

/// Configuration for an [`IdList`](crate::IdList).
///
/// `block_size` trades index size against walk length: lookups binary
/// search `len / block_size` index entries and then walk at most
/// `block_size` chain entries. `capacity` pre-sizes the node arena.
///
/// # Example
///
/// ```
/// use nexus_idlist::{IdList, ListConfig};
///
/// # struct Order(i64);
/// # impl nexus_idlist::Identified for Order { fn id(&self) -> i64 { self.0 } }
/// let config = ListConfig::new().block_size(32).capacity(10_000);
/// let list: IdList<Order> = IdList::with_config(config).unwrap();
/// assert_eq!(list.block_size(), 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ListConfig {
    /// Chain entries per quick-reference entry. Must be at least 1.
    pub block_size: usize,
    /// Number of nodes to pre-allocate arena space for.
    pub capacity: usize,
}

impl ListConfig {
    /// Creates the default configuration.
    pub const fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            capacity: 0,
        }
    }

    /// Sets the block size.
    pub const fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the pre-allocated capacity.
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Checks that the configuration can back a list.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidBlockSize);
        }
        Ok(())
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self::new()
    }
}
