//! Node kinds, display state and detached subtree descriptions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known attribute keys shared between the pipeline and tree adapters.
pub mod attrs {
    /// Hide marker written by content-hiding modules
    pub const HIDDEN_MARKER: &str = "data-rel-hidden";
    /// Set when the user explicitly hid an item
    pub const USER_HIDDEN: &str = "data-user-hidden";
    /// Cursor of the next page, carried by a listing
    pub const NEXT_CURSOR: &str = "data-next-cursor";
    /// Visible text of a control or marker
    pub const LABEL: &str = "label";
    /// Purpose of a control or marker
    pub const ROLE: &str = "role";
    /// Identity of the node a control belongs to
    pub const CONTROLS: &str = "data-for";
    /// Author of a post or comment
    pub const AUTHOR: &str = "data-author";
    /// Title of a post
    pub const TITLE: &str = "data-title";
    /// Link domain of a post
    pub const DOMAIN: &str = "data-domain";
    /// Community a post belongs to
    pub const SUBREDDIT: &str = "data-subreddit";
    /// Flair text of a post
    pub const FLAIR: &str = "data-flair";
    /// "true" when the post is marked NSFW
    pub const NSFW: &str = "data-nsfw";
    /// "true" when the post is a promoted (advertising) item
    pub const PROMOTED: &str = "data-promoted";
    /// Site-native collapsed state of a comment
    pub const COLLAPSED: &str = "collapsed";
    /// Target of a "continue this thread" marker
    pub const HREF: &str = "data-href";
}

/// Structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Root of the whole tree
    Document,
    /// Container of top-level items (posts or top-level comments)
    Listing,
    /// A post in a listing
    Post,
    /// A comment in a thread
    Comment,
    /// Interactive control attached by the pipeline (toggle, button)
    Control,
    /// Informational marker (page boundary, progress, "more comments")
    Marker,
}

impl NodeKind {
    /// Posts and comments; the nodes enrichment modules operate on
    pub fn is_content(self) -> bool {
        matches!(self, NodeKind::Post | NodeKind::Comment)
    }

    /// Lowercase name, as used in page markup
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Listing => "listing",
            NodeKind::Post => "post",
            NodeKind::Comment => "comment",
            NodeKind::Control => "control",
            NodeKind::Marker => "marker",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline display style of a node or of a comment's child container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    /// Rendered normally
    #[default]
    Default,
    /// Suppressed (`display: none`)
    None,
}

impl Display {
    /// Display value for a hidden flag
    pub fn hidden(hidden: bool) -> Self {
        if hidden {
            Display::None
        } else {
            Display::Default
        }
    }

    /// Whether this is `display: none`
    pub fn is_none(self) -> bool {
        self == Display::None
    }
}

/// Owned, detached description of a subtree.
///
/// This is both the page markup schema and the argument of every insertion
/// into a [`ContentTree`](crate::ContentTree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Structural kind
    pub kind: NodeKind,
    /// Stable identity (fullname), unique per session when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attribute map
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Children in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Create an empty node of the given kind
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// A post with the given identity
    pub fn post(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Post).with_id(id)
    }

    /// A comment with the given identity
    pub fn comment(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Comment).with_id(id)
    }

    /// A listing container
    pub fn listing() -> Self {
        Self::new(NodeKind::Listing)
    }

    /// A labelled marker with a role
    pub fn marker(role: &str, label: impl Into<String>) -> Self {
        Self::new(NodeKind::Marker)
            .with_attr(attrs::ROLE, role)
            .with_attr(attrs::LABEL, label)
    }

    /// A labelled control with a role
    pub fn control(role: &str, label: impl Into<String>) -> Self {
        Self::new(NodeKind::Control)
            .with_attr(attrs::ROLE, role)
            .with_attr(attrs::LABEL, label)
    }

    /// Set the identity
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Append a child
    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }

    /// Number of nodes in this subtree, including the root
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(NodeSpec::subtree_len).sum::<usize>()
    }
}
