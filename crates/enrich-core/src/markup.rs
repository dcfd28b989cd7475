//! Page markup decoding.
//!
//! A fetched page is a JSON document holding the candidate items in document
//! order and the cursor of the following page:
//!
//! ```json
//! { "items": [ { "kind": "post", "id": "t3_a" } ], "next": "after=t3_a" }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::ParseFailure;
use crate::node::NodeSpec;

/// Decoded page: candidate subtrees plus the next cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedPage {
    /// Candidate item roots, in document order
    #[serde(default)]
    pub items: Vec<NodeSpec>,
    /// Cursor of the following page; `None` when this is the last page
    #[serde(default)]
    pub next: Option<String>,
}

impl ParsedPage {
    /// Encode back to markup
    pub fn to_markup(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Decode page markup. Every item root must be a post or comment.
pub fn parse_page(markup: &str) -> Result<ParsedPage, ParseFailure> {
    let page: ParsedPage =
        serde_json::from_str(markup).map_err(|e| ParseFailure::malformed(e.to_string()))?;

    if let Some((index, item)) = page
        .items
        .iter()
        .enumerate()
        .find(|(_, item)| !item.kind.is_content())
    {
        return Err(ParseFailure::NonContentItem {
            index,
            kind: item.kind.to_string(),
        });
    }

    // Blank cursors are treated as "no next page".
    let next = page.next.filter(|cursor| !cursor.trim().is_empty());
    Ok(ParsedPage { next, ..page })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_page_with_nested_comments() {
        let markup = r#"{
            "items": [
                { "kind": "comment", "id": "t1_a", "children": [
                    { "kind": "comment", "id": "t1_b" }
                ]}
            ],
            "next": "after=t1_a"
        }"#;

        let page = parse_page(markup).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].children[0].kind, NodeKind::Comment);
        assert_eq!(page.next.as_deref(), Some("after=t1_a"));
    }

    #[test]
    fn test_encoded_page_decodes_unchanged() {
        let page = ParsedPage {
            items: vec![NodeSpec::post("t3_a").with_attr("data-title", "A \"quoted\" title")],
            next: Some("t3_a".to_string()),
        };
        assert_eq!(parse_page(&page.to_markup()).unwrap(), page);
    }

    #[test]
    fn test_blank_cursor_means_last_page() {
        let page = parse_page(r#"{ "items": [], "next": "  " }"#).unwrap();
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_malformed_markup_is_parse_failure() {
        assert_matches!(
            parse_page("<html>not a page</html>"),
            Err(ParseFailure::Malformed { .. })
        );
    }

    #[test]
    fn test_non_content_item_is_rejected() {
        let markup = r#"{ "items": [ { "kind": "post", "id": "a" }, { "kind": "marker" } ] }"#;
        assert_matches!(
            parse_page(markup),
            Err(ParseFailure::NonContentItem { index: 1, .. })
        );
    }
}
