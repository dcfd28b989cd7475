//! Network boundary for page requests.

use async_trait::async_trait;
use enrich_core::{parse_page, ParsedPage};

use crate::errors::{NetworkFailure, PaginationFailure};

/// Raw response to a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body (page markup)
    pub body: String,
}

impl PageResponse {
    /// A `200 OK` response
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// A response with an explicit status
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches pages by cursor.
///
/// Timeouts are the implementor's responsibility and are reported as
/// [`NetworkFailure::Timeout`].
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Request the page at `cursor`
    async fn request_page(&self, cursor: &str) -> Result<PageResponse, NetworkFailure>;
}

/// Turn a request outcome into parsed page content.
///
/// Non-success statuses and malformed markup are both failures.
pub fn decode_response(
    cursor: &str,
    response: Result<PageResponse, NetworkFailure>,
) -> Result<ParsedPage, PaginationFailure> {
    let response = response?;
    if !response.is_success() {
        return Err(NetworkFailure::Status {
            cursor: cursor.to_string(),
            status: response.status,
        }
        .into());
    }
    Ok(parse_page(&response.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use enrich_core::ParseFailure;

    #[test]
    fn test_non_success_status_is_network_failure() {
        let outcome = decode_response("t3_x", Ok(PageResponse::with_status(503, "")));
        assert_matches!(
            outcome,
            Err(PaginationFailure::Network(NetworkFailure::Status { status: 503, .. }))
        );
    }

    #[test]
    fn test_malformed_body_is_parse_failure() {
        let outcome = decode_response("t3_x", Ok(PageResponse::ok("<html>")));
        assert_matches!(outcome, Err(PaginationFailure::Parse(ParseFailure::Malformed { .. })));
    }

    #[test]
    fn test_transport_error_passes_through() {
        let failure = NetworkFailure::rejected("t3_x", "connection reset");
        assert_matches!(
            decode_response("t3_x", Err(failure.clone())),
            Err(PaginationFailure::Network(f)) if f == failure
        );
    }

    #[test]
    fn test_valid_page() {
        let page = decode_response("t3_x", Ok(PageResponse::ok(r#"{"items": [], "next": "t3_y"}"#)))
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next.as_deref(), Some("t3_y"));
    }
}
