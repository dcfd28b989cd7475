//! De-duplicating merge of fetched items.
//!
//! Items are merged in document order. An item whose identity is already in
//! the tree is not inserted again; its new descendants, if any, are appended
//! under the existing node instead. Re-merging a page, or merging a page that
//! overlaps an earlier one, therefore never duplicates an identity.

use std::collections::HashSet;

use enrich_core::{ContentTree, NodeId, NodeSpec, TreeError};

/// What one merge inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Roots of newly inserted subtrees, in document order
    pub roots: Vec<NodeId>,
    /// Nodes inserted, counting descendants
    pub inserted: usize,
    /// Candidates dropped because their identity already existed
    pub duplicates: usize,
}

/// Merge `items` as following siblings of `anchor`, in order.
pub fn merge_items(
    tree: &mut dyn ContentTree,
    anchor: NodeId,
    items: Vec<NodeSpec>,
) -> Result<MergeSummary, TreeError> {
    let mut summary = MergeSummary::default();
    let mut last = anchor;

    for item in items {
        if let Some(existing) = existing_node(&*tree, &item) {
            summary.duplicates += 1;
            merge_children(tree, existing, item.children, &mut summary)?;
            continue;
        }
        let spec = strip_known(&*tree, item, &mut HashSet::new(), &mut summary);
        summary.inserted += spec.subtree_len();
        last = tree.insert_after(last, spec)?;
        summary.roots.push(last);
    }

    tracing::debug!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "Merged fetched items"
    );
    Ok(summary)
}

fn merge_children(
    tree: &mut dyn ContentTree,
    parent: NodeId,
    children: Vec<NodeSpec>,
    summary: &mut MergeSummary,
) -> Result<(), TreeError> {
    for child in children {
        if let Some(existing) = existing_node(&*tree, &child) {
            summary.duplicates += 1;
            merge_children(tree, existing, child.children, summary)?;
            continue;
        }
        let spec = strip_known(&*tree, child, &mut HashSet::new(), summary);
        summary.inserted += spec.subtree_len();
        let node = tree.append_child(parent, spec)?;
        summary.roots.push(node);
    }
    Ok(())
}

fn existing_node(tree: &dyn ContentTree, spec: &NodeSpec) -> Option<NodeId> {
    spec.id
        .as_deref()
        .and_then(|identity| tree.find_by_identity(identity))
}

/// Drop descendants whose identity is already in the tree or repeats inside
/// the subtree itself.
fn strip_known(
    tree: &dyn ContentTree,
    spec: NodeSpec,
    seen: &mut HashSet<String>,
    summary: &mut MergeSummary,
) -> NodeSpec {
    if let Some(identity) = &spec.id {
        seen.insert(identity.clone());
    }
    let NodeSpec {
        kind,
        id,
        attributes,
        children,
    } = spec;

    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        let known = child
            .id
            .as_deref()
            .is_some_and(|identity| tree.contains_identity(identity) || seen.contains(identity));
        if known {
            summary.duplicates += 1;
            continue;
        }
        kept.push(strip_known(tree, child, seen, summary));
    }

    NodeSpec {
        kind,
        id,
        attributes,
        children: kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrich_core::{outline, MemoryTree, NodeKind, Selector};

    fn feed() -> (MemoryTree, NodeId) {
        let mut tree = MemoryTree::from_spec(
            NodeSpec::listing().with_children([NodeSpec::post("t3_a"), NodeSpec::post("t3_b")]),
        )
        .unwrap();
        let listing = tree.children(tree.root())[0];
        let marker = tree
            .append_child(listing, NodeSpec::marker("boundary", "— Page 2 —"))
            .unwrap();
        (tree, marker)
    }

    fn post_ids(tree: &MemoryTree) -> Vec<String> {
        tree.query_region(tree.root(), &Selector::Kind(NodeKind::Post))
            .into_iter()
            .filter_map(|n| tree.identity(n).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_items_follow_anchor_in_order() {
        let (mut tree, marker) = feed();
        let summary = merge_items(
            &mut tree,
            marker,
            vec![NodeSpec::post("t3_c"), NodeSpec::post("t3_d")],
        )
        .unwrap();

        assert_eq!(post_ids(&tree), vec!["t3_a", "t3_b", "t3_c", "t3_d"]);
        assert_eq!(summary.roots.len(), 2);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.duplicates, 0);
    }

    #[test]
    fn test_overlap_is_dropped() {
        let (mut tree, marker) = feed();
        let summary = merge_items(
            &mut tree,
            marker,
            vec![
                NodeSpec::post("t3_b"),
                NodeSpec::post("t3_c"),
                NodeSpec::post("t3_c"),
            ],
        )
        .unwrap();

        assert_eq!(post_ids(&tree), vec!["t3_a", "t3_b", "t3_c"]);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(summary.roots.len(), 1);
    }

    #[test]
    fn test_known_parent_receives_new_replies() {
        let mut tree = MemoryTree::from_spec(
            NodeSpec::listing().with_child(
                NodeSpec::comment("t1_a").with_child(NodeSpec::comment("t1_a1")),
            ),
        )
        .unwrap();
        let a = tree.find_by_identity("t1_a").unwrap();

        let summary = merge_items(
            &mut tree,
            a,
            vec![NodeSpec::comment("t1_a").with_children([
                NodeSpec::comment("t1_a1"),
                NodeSpec::comment("t1_a2"),
            ])],
        )
        .unwrap();

        assert_eq!(summary.duplicates, 2);
        assert_eq!(summary.inserted, 1);
        let a2 = tree.find_by_identity("t1_a2").unwrap();
        assert_eq!(tree.parent(a2), Some(a));
        assert_eq!(summary.roots, vec![a2]);
    }

    #[test]
    fn test_repeated_identity_inside_one_subtree() {
        let (mut tree, marker) = feed();
        merge_items(
            &mut tree,
            marker,
            vec![NodeSpec::post("t3_c").with_children([
                NodeSpec::comment("t1_x"),
                NodeSpec::comment("t1_x"),
            ])],
        )
        .unwrap();

        let text = outline(&tree, tree.root());
        assert_eq!(text.matches("t1_x").count(), 1);
    }
}
