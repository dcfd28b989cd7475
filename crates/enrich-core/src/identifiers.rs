//! Node handles.
//!
//! A [`NodeId`] is an index into the tree's arena. Handles are never reused
//! within a session, so a handle held across a removal is reported as unknown
//! instead of silently aliasing a newer node.

use std::fmt;

/// Opaque handle into a content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a handle from a raw arena index
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Raw arena index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
