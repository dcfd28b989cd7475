//! Inline "continue this thread" expansion.
//!
//! A thread continuation is a `Marker` with role [`MORE_COMMENTS_ROLE`] and a
//! [`attrs::HREF`] target. Expanding it fetches the target, merges the
//! comments after the marker with the same de-duplicating merge pagination
//! uses, then hides the marker.

use enrich_core::{attrs, ContentTree, Display, NodeId, NodeKind};

use crate::dispatcher::Region;
use crate::errors::{ExpansionError, NetworkFailure, PaginationFailure};
use crate::pagination::{decode_response, merge_items, PageResponse};

/// Role of a "continue this thread" marker
pub const MORE_COMMENTS_ROLE: &str = "more-comments";
/// Expansion progress written on the marker: `loading`, `loaded` or `error`
pub const EXPAND_STATE_ATTR: &str = "data-rel-expand";

/// Comments merged by one expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedThread {
    /// Marker that was expanded
    pub anchor: NodeId,
    /// Newly inserted roots, ready for dispatch
    pub region: Region,
    /// Nodes inserted, counting descendants
    pub inserted: usize,
    /// Candidates dropped as duplicates
    pub duplicates: usize,
}

/// Validate an expansion target and mark it as loading; returns the href.
pub fn begin_expansion(tree: &mut dyn ContentTree, anchor: NodeId) -> Result<String, ExpansionError> {
    let not_expandable = ExpansionError::NotExpandable { node: anchor };
    if tree.kind(anchor) != Some(NodeKind::Marker)
        || tree.get_attribute(anchor, attrs::ROLE) != Some(MORE_COMMENTS_ROLE)
    {
        return Err(not_expandable);
    }
    match tree.get_attribute(anchor, EXPAND_STATE_ATTR) {
        Some("loaded") => return Err(ExpansionError::AlreadyExpanded { node: anchor }),
        Some("loading") => return Err(not_expandable),
        _ => {}
    }
    let href = match tree.get_attribute(anchor, attrs::HREF) {
        Some(href) if !href.trim().is_empty() => href.to_string(),
        _ => return Err(not_expandable),
    };
    tree.set_attribute(anchor, EXPAND_STATE_ATTR, "loading")
        .map_err(PaginationFailure::from)?;
    Ok(href)
}

/// Merge the fetched thread after `anchor`.
///
/// On success the marker is tagged `loaded` and hidden. On failure it is
/// tagged `error` and stays visible so it can be activated again.
pub fn complete_expansion(
    tree: &mut dyn ContentTree,
    anchor: NodeId,
    href: &str,
    response: Result<PageResponse, NetworkFailure>,
) -> Result<ExpandedThread, PaginationFailure> {
    let merged = decode_response(href, response).and_then(|page| {
        let summary = merge_items(tree, anchor, page.items)?;
        tree.set_attribute(anchor, EXPAND_STATE_ATTR, "loaded")?;
        tree.set_inline_display(anchor, Display::None)?;
        Ok(summary)
    });

    match merged {
        Ok(summary) => Ok(ExpandedThread {
            anchor,
            region: Region::Items(summary.roots),
            inserted: summary.inserted,
            duplicates: summary.duplicates,
        }),
        Err(failure) => {
            tracing::warn!(href, error = %failure, "Thread expansion failed");
            if let Err(error) = tree.set_attribute(anchor, EXPAND_STATE_ATTR, "error") {
                tracing::warn!(href, error = %error, "Could not mark expansion as failed");
            }
            Err(failure)
        }
    }
}
