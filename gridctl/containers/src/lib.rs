#![no_std]
#![forbid(unsafe_code)]

//! # Gridctl Containers
//!
//! Fixed-capacity containers over arena-owned nodes. Callers hold [`NodeId`]
//! handles; the arena keeps the storage. A node is in at most one list or
//! heap at a time and moving it is always a detach followed by a link.

use core::fmt;

pub mod heap;
pub mod list;
pub mod queue;

pub use heap::*;
pub use list::*;
pub use queue::*;

/// Stable handle to a node slot in an arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u16);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u16)
    }

    /// Slot index inside the owning arena
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NodeId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "#{}", self.0);
    }
}
