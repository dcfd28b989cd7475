//! Tree and page fixtures.

use enrich_core::{
    attrs, ContentTree, DocumentOrder, FeatureConfig, MemoryTree, NodeId, NodeKind, NodeSpec,
    ParsedPage, Selector,
};

/// Post identity used by the fixtures: `t3_<n>`
pub fn post_id(n: usize) -> String {
    format!("t3_{n}")
}

/// A post with a title, as the listing fixtures create them
pub fn post(id: &str) -> NodeSpec {
    NodeSpec::post(id).with_attr(attrs::TITLE, format!("Post {id}"))
}

/// A top-level comment with `children` direct replies `<id>_0..`
pub fn comment_with_replies(id: &str, children: usize) -> NodeSpec {
    NodeSpec::comment(id)
        .with_children((0..children).map(|i| NodeSpec::comment(format!("{id}_{i}"))))
}

/// A feed listing posts `t3_0..t3_{count-1}`, advertising `next` as its cursor
pub fn feed(count: usize, next: Option<&str>) -> MemoryTree {
    let mut listing = NodeSpec::listing().with_children((0..count).map(|n| post(&post_id(n))));
    if let Some(next) = next {
        listing = listing.with_attr(attrs::NEXT_CURSOR, next);
    }
    MemoryTree::from_spec(listing).expect("fixture feed is valid")
}

/// A comment page: one top-level comment per `(identity, replies)` entry
pub fn comment_page(threads: &[(&str, usize)], next: Option<&str>) -> MemoryTree {
    let mut listing = NodeSpec::listing()
        .with_children(threads.iter().map(|(id, n)| comment_with_replies(id, *n)));
    if let Some(next) = next {
        listing = listing.with_attr(attrs::NEXT_CURSOR, next);
    }
    MemoryTree::from_spec(listing).expect("fixture thread is valid")
}

/// Page markup holding posts with the given identities
pub fn post_page_markup(ids: &[&str], next: Option<&str>) -> String {
    page_markup(ids.iter().map(|id| post(id)).collect(), next)
}

/// Page markup holding arbitrary items
pub fn page_markup(items: Vec<NodeSpec>, next: Option<&str>) -> String {
    ParsedPage {
        items,
        next: next.map(str::to_string),
    }
    .to_markup()
}

/// Configuration with every built-in feature at its default and no delays
pub fn test_config() -> FeatureConfig {
    FeatureConfig {
        ner_scroll_interval_ms: 0,
        ..FeatureConfig::default()
    }
}

/// The first listing of a tree
pub fn listing_of(tree: &dyn ContentTree) -> NodeId {
    tree.query_region(tree.root(), &Selector::Kind(NodeKind::Listing))[0]
}

/// Identities of all nodes matching `selector`, in document order
pub fn identities(tree: &dyn ContentTree, selector: &Selector) -> Vec<String> {
    tree.query_region(tree.root(), selector)
        .into_iter()
        .filter_map(|node| tree.identity(node).map(str::to_string))
        .collect()
}

/// Number of nodes carrying `identity`
pub fn identity_count(tree: &dyn ContentTree, identity: &str) -> usize {
    DocumentOrder::new(tree, tree.root())
        .filter(|node| tree.identity(*node) == Some(identity))
        .count()
}

/// Look a node up by identity, panicking when it is missing
pub fn node(tree: &dyn ContentTree, identity: &str) -> NodeId {
    tree.find_by_identity(identity)
        .unwrap_or_else(|| panic!("no node with identity {identity}"))
}

/// Auxiliary nodes with the given role, in document order
pub fn with_role(tree: &dyn ContentTree, role: &str) -> Vec<NodeId> {
    tree.query_region(tree.root(), &Selector::attr_eq(attrs::ROLE, role))
}
