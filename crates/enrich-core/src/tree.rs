//! Content Tree Adapter
//!
//! The externally-owned content tree is consumed through [`ContentTree`]. The
//! pipeline never owns nodes; it holds [`NodeId`] handles and asks the adapter
//! for structure, attributes and display state.
//!
//! Implementors provide the primitive accessors and mutators. Region queries,
//! markup parsing and visibility resolution are provided on top of them so
//! every adapter answers those questions the same way.

use crate::errors::{ParseFailure, TreeError};
use crate::identifiers::NodeId;
use crate::markup::{self, ParsedPage};
use crate::node::{Display, NodeKind, NodeSpec};
use crate::selector::Selector;
use crate::style::StyleRule;
use crate::traversal::DocumentOrder;

/// Queryable, mutable tree of posts, comments and auxiliary nodes.
pub trait ContentTree {
    /// Document root
    fn root(&self) -> NodeId;

    /// Kind of a live node, `None` for unknown handles
    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    /// Stable identity (fullname) of a node, if it has one
    fn identity(&self, node: NodeId) -> Option<&str>;

    /// Parent of a node; `None` for the root and unknown handles
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in document order; empty for unknown handles
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Look a node up by identity
    fn find_by_identity(&self, identity: &str) -> Option<NodeId>;

    /// Read an attribute
    fn get_attribute(&self, node: NodeId, key: &str) -> Option<&str>;

    /// Write an attribute
    fn set_attribute(&mut self, node: NodeId, key: &str, value: &str) -> Result<(), TreeError>;

    /// Remove an attribute; absent attributes are not an error
    fn remove_attribute(&mut self, node: NodeId, key: &str) -> Result<(), TreeError>;

    /// Insert a detached subtree as the next sibling of `anchor`
    fn insert_after(&mut self, anchor: NodeId, spec: NodeSpec) -> Result<NodeId, TreeError>;

    /// Insert a detached subtree as the last child of `parent`
    fn append_child(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId, TreeError>;

    /// Remove a node and its subtree
    fn remove(&mut self, node: NodeId) -> Result<(), TreeError>;

    /// Inline display style of the node itself
    fn inline_display(&self, node: NodeId) -> Display;

    /// Set the inline display style of the node itself
    fn set_inline_display(&mut self, node: NodeId, display: Display) -> Result<(), TreeError>;

    /// Display style of the container holding a node's children
    fn children_display(&self, node: NodeId) -> Display;

    /// Set the display style of the container holding a node's children
    fn set_children_display(&mut self, node: NodeId, display: Display) -> Result<(), TreeError>;

    /// Installed stylesheet hide rules
    fn style_rules(&self) -> &[StyleRule];

    /// Install a stylesheet hide rule
    fn add_style_rule(&mut self, rule: StyleRule);

    /// Withdraw every rule installed by `owner`, returning how many were removed
    fn remove_style_rules(&mut self, owner: &str) -> usize;

    /// All nodes in the subtree rooted at `region` matching `selector`, in
    /// document order. The region root itself is included when it matches.
    fn query_region(&self, region: NodeId, selector: &Selector) -> Vec<NodeId> {
        DocumentOrder::new(self, region)
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    /// Parse fetched page markup into candidate nodes
    fn parse_fragment(&self, markup: &str) -> Result<ParsedPage, ParseFailure> {
        markup::parse_page(markup)
    }

    /// Whether an installed stylesheet rule hides this node
    fn hidden_by_stylesheet(&self, node: NodeId) -> bool {
        self.style_rules()
            .iter()
            .any(|rule| rule.selector.matches(self, node))
    }

    /// Whether the node would be rendered: neither it nor any ancestor is
    /// suppressed inline or by a stylesheet rule, and no ancestor has its
    /// child container suppressed.
    fn is_rendered(&self, node: NodeId) -> bool {
        if self.kind(node).is_none() {
            return false;
        }
        if self.inline_display(node).is_none() || self.hidden_by_stylesheet(node) {
            return false;
        }
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            if self.children_display(ancestor).is_none()
                || self.inline_display(ancestor).is_none()
                || self.hidden_by_stylesheet(ancestor)
            {
                return false;
            }
            current = self.parent(ancestor);
        }
        true
    }

    /// Whether the node sits directly under a listing
    fn is_top_level(&self, node: NodeId) -> bool {
        self.parent(node)
            .and_then(|parent| self.kind(parent))
            .is_some_and(|kind| kind == NodeKind::Listing)
    }

    /// Number of strict ancestors of the given kind
    fn depth_of(&self, node: NodeId, kind: NodeKind) -> usize {
        let mut depth = 0;
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            if self.kind(ancestor) == Some(kind) {
                depth += 1;
            }
            current = self.parent(ancestor);
        }
        depth
    }

    /// Direct children of the given kind, in document order
    fn children_of_kind(&self, node: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|child| self.kind(*child) == Some(kind))
            .collect()
    }

    /// Whether a node with this identity already exists
    fn contains_identity(&self, identity: &str) -> bool {
        self.find_by_identity(identity).is_some()
    }
}
