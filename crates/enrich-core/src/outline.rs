//! Human-readable outline of a tree, one node per line.

use std::fmt::Write;

use crate::identifiers::NodeId;
use crate::node::attrs;
use crate::tree::ContentTree;

/// Render the subtree rooted at `root`.
///
/// Each line is `kind identity [label] (flags)` indented two spaces per level.
/// Flags: `hidden` (not rendered), `collapsed` (child container suppressed).
pub fn outline<T: ContentTree + ?Sized>(tree: &T, root: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let Some(kind) = tree.kind(node) else {
            continue;
        };
        let _ = write!(out, "{:indent$}{kind}", "", indent = depth * 2);
        if let Some(identity) = tree.identity(node) {
            let _ = write!(out, " {identity}");
        }
        if let Some(label) = tree.get_attribute(node, attrs::LABEL) {
            let _ = write!(out, " [{label}]");
        }
        let mut flags = Vec::new();
        if !tree.is_rendered(node) {
            flags.push("hidden");
        }
        if tree.children_display(node).is_none() {
            flags.push("collapsed");
        }
        if !flags.is_empty() {
            let _ = write!(out, " ({})", flags.join(", "));
        }
        out.push('\n');

        for child in tree.children(node).iter().rev() {
            stack.push((*child, depth + 1));
        }
    }
    out
}
