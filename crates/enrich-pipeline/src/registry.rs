//! Idempotency Registry
//!
//! Records which module has already processed which node. Marks live here,
//! keyed by node handle, rather than as attributes on the externally-owned
//! tree.

use std::collections::HashSet;
use std::fmt;

use enrich_core::{ContentTree, NodeId};

/// Stable identifier of an enrichment module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(&'static str);

impl ModuleId {
    /// Create a module identifier
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Identifier as a string
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Record that `module` has processed `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessingMark {
    /// Module that ran
    pub module: ModuleId,
    /// Node it ran on
    pub node: NodeId,
}

/// Set of processing marks.
///
/// Marks are only ever added while their node exists; [`prune`](Self::prune)
/// drops marks whose node has been removed from the tree.
#[derive(Debug, Default)]
pub struct ProcessingRegistry {
    marks: HashSet<ProcessingMark>,
}

impl ProcessingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `module` has already processed `node`
    pub fn is_marked(&self, module: ModuleId, node: NodeId) -> bool {
        self.marks.contains(&ProcessingMark { module, node })
    }

    /// Record a mark; returns `false` if it was already present
    pub fn mark(&mut self, module: ModuleId, node: NodeId) -> bool {
        self.marks.insert(ProcessingMark { module, node })
    }

    /// Number of nodes processed by `module`
    pub fn count_for(&self, module: ModuleId) -> usize {
        self.marks.iter().filter(|mark| mark.module == module).count()
    }

    /// Total number of marks
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Whether no mark has been recorded
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Drop marks of nodes that no longer exist; returns how many were dropped
    pub fn prune(&mut self, tree: &dyn ContentTree) -> usize {
        let before = self.marks.len();
        self.marks.retain(|mark| tree.kind(mark.node).is_some());
        before - self.marks.len()
    }
}
