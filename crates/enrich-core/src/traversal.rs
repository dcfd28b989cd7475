//! Document-order traversal
//!
//! One traversal utility shared by the dispatcher, the collapse state machine
//! and the safety guard. The iterator is lazy (children are expanded only when
//! their parent is yielded) and restartable: it can be cloned at any point or
//! rewound to its root with [`DocumentOrder::restart`].

use crate::identifiers::NodeId;
use crate::tree::ContentTree;

/// Pre-order iterator over the subtree rooted at a node.
///
/// The root is yielded first. An unknown root yields nothing.
pub struct DocumentOrder<'a, T: ContentTree + ?Sized> {
    tree: &'a T,
    root: NodeId,
    stack: Vec<NodeId>,
}

impl<'a, T: ContentTree + ?Sized> DocumentOrder<'a, T> {
    /// Start a traversal at `root`
    pub fn new(tree: &'a T, root: NodeId) -> Self {
        let mut stack = Vec::new();
        if tree.kind(root).is_some() {
            stack.push(root);
        }
        Self { tree, root, stack }
    }

    /// Rewind to the root
    pub fn restart(&mut self) {
        self.stack.clear();
        if self.tree.kind(self.root).is_some() {
            self.stack.push(self.root);
        }
    }

    /// Root of this traversal
    pub fn root(&self) -> NodeId {
        self.root
    }
}

impl<T: ContentTree + ?Sized> Clone for DocumentOrder<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            root: self.root,
            stack: self.stack.clone(),
        }
    }
}

impl<T: ContentTree + ?Sized> Iterator for DocumentOrder<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(node).iter().rev().copied());
        Some(node)
    }
}

/// Content nodes (posts and comments) of a subtree in document order.
pub fn content_nodes<T: ContentTree + ?Sized>(tree: &T, root: NodeId) -> Vec<NodeId> {
    DocumentOrder::new(tree, root)
        .filter(|node| tree.kind(*node).is_some_and(|kind| kind.is_content()))
        .collect()
}
