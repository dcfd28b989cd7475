//! Opaque pointer to the next page.

use std::fmt;

use enrich_core::{attrs, ContentTree, NodeId};

/// Cursor of the next page; `None` means there is no next page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PageCursor(Option<String>);

impl PageCursor {
    /// No further pages
    pub fn none() -> Self {
        Self(None)
    }

    /// Cursor pointing at a page. Blank values mean "no next page".
    pub fn at(cursor: impl Into<String>) -> Self {
        Self::from_next(Some(cursor.into()))
    }

    /// Cursor from an optional `next` value, as found in page markup
    pub fn from_next(next: Option<String>) -> Self {
        Self(next.filter(|value| !value.trim().is_empty()))
    }

    /// Cursor advertised by a listing through [`attrs::NEXT_CURSOR`]
    pub fn from_listing(tree: &dyn ContentTree, listing: NodeId) -> Self {
        Self::from_next(tree.get_attribute(listing, attrs::NEXT_CURSOR).map(str::to_string))
    }

    /// Cursor value
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether there is no next page
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(cursor) => f.write_str(cursor),
            None => f.write_str("<none>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrich_core::{MemoryTree, NodeSpec};

    #[test]
    fn test_blank_cursor_is_none() {
        assert!(PageCursor::at("  ").is_none());
        assert!(PageCursor::from_next(None).is_none());
        assert_eq!(PageCursor::at("t3_abc").as_str(), Some("t3_abc"));
        assert_eq!(PageCursor::none().to_string(), "<none>");
    }

    #[test]
    fn test_read_from_listing() {
        let tree = MemoryTree::from_spec(
            NodeSpec::listing().with_attr(attrs::NEXT_CURSOR, "t3_after"),
        )
        .unwrap();
        let listing = tree.children(tree.root())[0];
        assert_eq!(PageCursor::from_listing(&tree, listing), PageCursor::at("t3_after"));
    }
}
