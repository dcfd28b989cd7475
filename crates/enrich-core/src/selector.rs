//! Selector-like predicates over tree nodes.

use crate::identifiers::NodeId;
use crate::node::NodeKind;
use crate::tree::ContentTree;

/// A small, closed selector language used by region queries and stylesheet
/// rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every node
    Any,
    /// Posts and comments
    Content,
    /// Nodes of one kind
    Kind(NodeKind),
    /// Posts or comments whose parent is a listing
    TopLevelItem,
    /// Nodes carrying an attribute, whatever its value
    HasAttribute(String),
    /// Nodes whose attribute equals a value
    AttributeEquals(String, String),
    /// All of the inner selectors match
    All(Vec<Selector>),
}

impl Selector {
    /// Convenience constructor for [`Selector::AttributeEquals`]
    pub fn attr_eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Selector::AttributeEquals(key.into(), value.into())
    }

    /// Evaluate against a node. Unknown nodes never match.
    pub fn matches<T: ContentTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        let Some(kind) = tree.kind(node) else {
            return false;
        };
        match self {
            Selector::Any => true,
            Selector::Content => kind.is_content(),
            Selector::Kind(wanted) => kind == *wanted,
            Selector::TopLevelItem => kind.is_content() && tree.is_top_level(node),
            Selector::HasAttribute(key) => tree.get_attribute(node, key).is_some(),
            Selector::AttributeEquals(key, value) => {
                tree.get_attribute(node, key) == Some(value.as_str())
            }
            Selector::All(inner) => inner.iter().all(|s| s.matches(tree, node)),
        }
    }
}
