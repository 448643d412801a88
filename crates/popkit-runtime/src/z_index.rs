#![forbid(unsafe_code)]

//! Stacking-order allocation for floating panels.
//!
//! Each panel that becomes visible takes the next z-index so later panels
//! stack above earlier ones. The allocator is an explicit service shared by
//! the controllers of one page (clone it to share), so tests can construct
//! their own and assert exact values.

use std::cell::Cell;
use std::rc::Rc;

/// First z-index handed out by [`ZIndexAllocator::default`].
pub const DEFAULT_Z_INDEX_BASE: u32 = 2000;

/// Monotonic z-index source. Clones share the counter.
#[derive(Debug, Clone)]
pub struct ZIndexAllocator {
    next: Rc<Cell<u32>>,
}

impl ZIndexAllocator {
    /// Start allocating at `base`.
    #[must_use]
    pub fn new(base: u32) -> Self {
        Self {
            next: Rc::new(Cell::new(base)),
        }
    }

    /// Take the next z-index.
    pub fn allocate(&self) -> u32 {
        let value = self.next.get();
        self.next.set(value.saturating_add(1));
        value
    }

    /// The value the next `allocate` will return.
    #[must_use]
    pub fn peek(&self) -> u32 {
        self.next.get()
    }
}

impl Default for ZIndexAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_Z_INDEX_BASE)
    }
}
