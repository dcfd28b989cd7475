//! Pagination state machine.

use enrich_core::{attrs, ContentTree, NodeId, NodeSpec};

use super::cursor::PageCursor;
use super::merge::merge_items;
use super::source::{decode_response, PageResponse};
use crate::dispatcher::Region;
use crate::errors::{NetworkFailure, PaginationFailure};

/// Role of the progress marker, later the page boundary
pub const BOUNDARY_ROLE: &str = "page-boundary";
/// Role of the error marker that retries the failed page
pub const RETRY_ROLE: &str = "retry";
/// Role of the marker that resumes a paused engine
pub const PAUSE_ROLE: &str = "resume";

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    /// Ready to load the page at the cursor
    Idle,
    /// One request in flight
    Loading,
    /// Pause threshold reached; waiting for the resume affordance
    Paused,
    /// No next page; scroll triggers are ignored for this page view
    Exhausted,
}

/// Permission to complete one in-flight load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Fetch generation; only the latest generation may complete
    pub generation: u64,
    /// Cursor being requested
    pub cursor: String,
    /// Number shown on the page boundary
    pub page_number: u32,
    placeholder: NodeId,
}

impl FetchTicket {
    /// Progress marker placed for this fetch
    pub fn placeholder(&self) -> NodeId {
        self.placeholder
    }
}

/// Items merged from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPage {
    /// Number shown on the page boundary
    pub page_number: u32,
    /// Newly inserted roots, ready for dispatch
    pub region: Region,
    /// Nodes inserted, counting descendants
    pub inserted: usize,
    /// Candidates dropped as duplicates
    pub duplicates: usize,
    /// Cursor after this page
    pub next: PageCursor,
}

/// Infinite pagination over one listing.
#[derive(Debug)]
pub struct PaginationEngine {
    pause_after_pages: u32,
    state: PaginationState,
    cursor: PageCursor,
    listing: Option<NodeId>,
    page_count: u32,
    pages_merged: u32,
    generation: u64,
    requests_issued: u64,
    placeholder: Option<NodeId>,
    error_marker: Option<NodeId>,
    pause_marker: Option<NodeId>,
    last_failure: Option<PaginationFailure>,
}

impl PaginationEngine {
    /// Create an engine; `pause_after_pages = 0` never pauses
    pub fn new(pause_after_pages: u32) -> Self {
        Self {
            pause_after_pages,
            state: PaginationState::Idle,
            cursor: PageCursor::none(),
            listing: None,
            page_count: 0,
            pages_merged: 0,
            generation: 0,
            requests_issued: 0,
            placeholder: None,
            error_marker: None,
            pause_marker: None,
            last_failure: None,
        }
    }

    /// Change the pause threshold
    pub fn configure(&mut self, pause_after_pages: u32) {
        self.pause_after_pages = pause_after_pages;
    }

    /// Bind to a listing and read its advertised cursor
    pub fn attach(&mut self, tree: &dyn ContentTree, listing: NodeId) -> PaginationState {
        self.listing = Some(listing);
        self.cursor = PageCursor::from_listing(tree, listing);
        self.state = if self.cursor.is_none() {
            PaginationState::Exhausted
        } else {
            PaginationState::Idle
        };
        tracing::info!(cursor = %self.cursor, state = ?self.state, "Pagination attached");
        self.state
    }

    /// Current state
    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Cursor of the next page
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Pages loaded since the last resume
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Pages merged over the whole page view
    pub fn pages_merged(&self) -> u32 {
        self.pages_merged
    }

    /// Requests started so far
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    /// Failure behind the current retry affordance
    pub fn last_failure(&self) -> Option<&PaginationFailure> {
        self.last_failure.as_ref()
    }

    /// Retry affordance, when the last load failed
    pub fn error_marker(&self) -> Option<NodeId> {
        self.error_marker
    }

    /// Resume affordance, when paused
    pub fn pause_marker(&self) -> Option<NodeId> {
        self.pause_marker
    }

    /// Whether a load may start now
    /// Whether a listing is bound
    pub fn is_attached(&self) -> bool {
        self.listing.is_some()
    }

    /// Whether a load may start now
    pub fn can_load(&self) -> bool {
        self.state == PaginationState::Idle && !self.cursor.is_none() && self.listing.is_some()
    }

    /// Whether a completion for `ticket` would be accepted
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.state == PaginationState::Loading && ticket.generation == self.generation
    }

    /// Check-and-set `Loading` and place the progress marker.
    ///
    /// Returns `None` without side effects unless the engine is `Idle` with a
    /// cursor. A stale retry affordance is removed; the cursor is reused.
    pub fn begin_load(&mut self, tree: &mut dyn ContentTree) -> Option<FetchTicket> {
        if !self.can_load() {
            tracing::debug!(state = ?self.state, cursor = %self.cursor, "Page load refused");
            return None;
        }
        let listing = self.listing?;
        let cursor = self.cursor.as_str()?.to_string();

        if let Some(marker) = self.error_marker.take() {
            remove_marker(tree, marker, RETRY_ROLE);
        }

        let page_number = self.pages_merged + 2;
        let placeholder = match tree.append_child(
            listing,
            NodeSpec::marker(BOUNDARY_ROLE, format!("Loading page {page_number}...")),
        ) {
            Ok(node) => node,
            Err(error) => {
                tracing::warn!(error = %error, "Could not place progress marker");
                return None;
            }
        };

        self.state = PaginationState::Loading;
        self.generation += 1;
        self.requests_issued += 1;
        self.placeholder = Some(placeholder);
        tracing::info!(cursor = %cursor, page = page_number, "Loading page");

        Some(FetchTicket {
            generation: self.generation,
            cursor,
            page_number,
            placeholder,
        })
    }

    /// Merge the outcome of the request behind `ticket`.
    ///
    /// On success the progress marker becomes the page boundary, the cursor
    /// advances (even when every item was a duplicate) and `page_count` grows;
    /// the state stays `Loading` until [`finish_page`](Self::finish_page). On
    /// failure the marker becomes the retry affordance, the state returns to
    /// `Idle` and the cursor is kept. Stale tickets change nothing.
    pub fn merge_response(
        &mut self,
        tree: &mut dyn ContentTree,
        ticket: &FetchTicket,
        response: Result<PageResponse, NetworkFailure>,
    ) -> Result<MergedPage, PaginationFailure> {
        if !self.is_current(ticket) {
            tracing::debug!(generation = ticket.generation, "Ignoring stale page response");
            return Err(PaginationFailure::StaleTicket {
                generation: ticket.generation,
            });
        }

        match self.merge_page(tree, ticket, response) {
            Ok(page) => {
                self.cursor = page.next.clone();
                self.page_count += 1;
                self.pages_merged += 1;
                tracing::info!(
                    page = page.page_number,
                    inserted = page.inserted,
                    duplicates = page.duplicates,
                    next = %page.next,
                    "Page merged"
                );
                Ok(page)
            }
            Err(failure) => {
                self.fail(tree, ticket, failure.clone());
                Err(failure)
            }
        }
    }

    /// Settle after the merged region has been dispatched
    pub fn finish_page(&mut self, tree: &mut dyn ContentTree) -> PaginationState {
        if self.state != PaginationState::Loading {
            return self.state;
        }
        self.placeholder = None;
        self.last_failure = None;

        self.state = if self.cursor.is_none() {
            PaginationState::Exhausted
        } else if self.pause_after_pages > 0 && self.page_count >= self.pause_after_pages {
            self.place_pause_marker(tree);
            PaginationState::Paused
        } else {
            PaginationState::Idle
        };
        tracing::info!(state = ?self.state, pages = self.page_count, "Page load finished");
        self.state
    }

    /// Activate the retry affordance
    pub fn retry(&mut self, tree: &mut dyn ContentTree) -> Option<FetchTicket> {
        if self.last_failure.is_none() {
            return None;
        }
        tracing::info!(cursor = %self.cursor, "Retrying page");
        self.begin_load(tree)
    }

    /// Activate the resume affordance: reset `page_count` and load
    pub fn resume(&mut self, tree: &mut dyn ContentTree) -> Option<FetchTicket> {
        if self.state != PaginationState::Paused {
            return None;
        }
        if let Some(marker) = self.pause_marker.take() {
            remove_marker(tree, marker, PAUSE_ROLE);
        }
        self.page_count = 0;
        self.state = PaginationState::Idle;
        tracing::info!("Pagination resumed");
        self.begin_load(tree)
    }

    fn merge_page(
        &self,
        tree: &mut dyn ContentTree,
        ticket: &FetchTicket,
        response: Result<PageResponse, NetworkFailure>,
    ) -> Result<MergedPage, PaginationFailure> {
        let page = decode_response(&ticket.cursor, response)?;
        let summary = merge_items(tree, ticket.placeholder, page.items)?;
        tree.set_attribute(
            ticket.placeholder,
            attrs::LABEL,
            &format!("— Page {} —", ticket.page_number),
        )?;
        Ok(MergedPage {
            page_number: ticket.page_number,
            region: Region::Items(summary.roots),
            inserted: summary.inserted,
            duplicates: summary.duplicates,
            next: PageCursor::from_next(page.next),
        })
    }

    fn fail(&mut self, tree: &mut dyn ContentTree, ticket: &FetchTicket, failure: PaginationFailure) {
        tracing::warn!(cursor = %ticket.cursor, error = %failure, "Page load failed");
        let marker = ticket.placeholder;
        let relabeled = tree
            .set_attribute(marker, attrs::LABEL, "Error loading next page. Click to retry.")
            .and_then(|()| tree.set_attribute(marker, attrs::ROLE, RETRY_ROLE));
        if let Err(error) = relabeled {
            tracing::warn!(error = %error, "Could not place retry affordance");
        } else {
            self.error_marker = Some(marker);
        }
        self.placeholder = None;
        self.last_failure = Some(failure);
        self.state = PaginationState::Idle;
    }

    fn place_pause_marker(&mut self, tree: &mut dyn ContentTree) {
        let Some(listing) = self.listing else {
            return;
        };
        let label = format!("Paused after {} pages. Click to load more.", self.page_count);
        match tree.append_child(listing, NodeSpec::marker(PAUSE_ROLE, label)) {
            Ok(marker) => self.pause_marker = Some(marker),
            Err(error) => tracing::warn!(error = %error, "Could not place resume affordance"),
        }
    }
}

/// Remove one of the engine's own markers. A marker already removed by the
/// page is not an error for the load that follows.
fn remove_marker(tree: &mut dyn ContentTree, marker: NodeId, role: &str) {
    if let Err(error) = tree.remove(marker) {
        tracing::warn!(role, marker = ?marker, error = %error, "Could not remove marker");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use enrich_core::{MemoryTree, NodeKind, ParsedPage, Selector};

    fn listing_tree(cursor: Option<&str>) -> (MemoryTree, NodeId) {
        let mut listing = NodeSpec::listing().with_child(NodeSpec::post("t3_a"));
        if let Some(cursor) = cursor {
            listing = listing.with_attr(attrs::NEXT_CURSOR, cursor);
        }
        let tree = MemoryTree::from_spec(listing).unwrap();
        let listing = tree.children(tree.root())[0];
        (tree, listing)
    }

    fn page(ids: &[&str], next: Option<&str>) -> PageResponse {
        PageResponse::ok(
            ParsedPage {
                items: ids.iter().map(|id| NodeSpec::post(*id)).collect(),
                next: next.map(str::to_string),
            }
            .to_markup(),
        )
    }

    fn posts(tree: &MemoryTree) -> usize {
        tree.query_region(tree.root(), &Selector::Kind(NodeKind::Post)).len()
    }

    #[test]
    fn test_retry_survives_marker_removed_by_page() {
        let (mut tree, listing) = listing_tree(Some("p2"));
        let mut engine = PaginationEngine::new(0);
        engine.attach(&tree, listing);
        let ticket = engine.begin_load(&mut tree).unwrap();
        let failure = NetworkFailure::rejected("p2", "offline");
        assert!(engine.merge_response(&mut tree, &ticket, Err(failure)).is_err());

        let marker = engine.error_marker().unwrap();
        tree.remove(marker).unwrap();

        let retry = engine.retry(&mut tree).unwrap();
        assert_eq!(retry.cursor, "p2");
        assert_eq!(engine.error_marker(), None);
        assert_eq!(engine.state(), PaginationState::Loading);
        let merged = engine.merge_response(&mut tree, &retry, Ok(page(&["t3_b"], None)));
        assert!(merged.is_ok());
        assert_eq!(posts(&tree), 2);
    }

    #[test]
    fn test_attach_without_cursor_is_exhausted() {
        let (mut tree, listing) = listing_tree(None);
        let mut engine = PaginationEngine::new(0);
        assert_eq!(engine.attach(&tree, listing), PaginationState::Exhausted);
        assert_eq!(engine.begin_load(&mut tree), None);
    }

    #[test]
    fn test_second_begin_while_loading_is_refused() {
        let (mut tree, listing) = listing_tree(Some("t3_a"));
        let mut engine = PaginationEngine::new(0);
        engine.attach(&tree, listing);

        let ticket = engine.begin_load(&mut tree).unwrap();
        assert_eq!(engine.state(), PaginationState::Loading);
        assert_eq!(engine.begin_load(&mut tree), None);
        assert_eq!(engine.requests_issued(), 1);
        assert_eq!(
            tree.get_attribute(ticket.placeholder(), attrs::LABEL),
            Some("Loading page 2...")
        );
    }

    #[test]
    fn test_successful_page_advances_cursor() {
        let (mut tree, listing) = listing_tree(Some("t3_a"));
        let mut engine = PaginationEngine::new(0);
        engine.attach(&tree, listing);

        let ticket = engine.begin_load(&mut tree).unwrap();
        let merged = engine
            .merge_response(&mut tree, &ticket, Ok(page(&["t3_b", "t3_c"], Some("t3_c"))))
            .unwrap();

        assert_eq!(merged.inserted, 2);
        assert_eq!(engine.cursor(), &PageCursor::at("t3_c"));
        assert_eq!(engine.finish_page(&mut tree), PaginationState::Idle);
        assert_eq!(posts(&tree), 3);
        assert_eq!(
            tree.get_attribute(ticket.placeholder(), attrs::LABEL),
            Some("— Page 2 —")
        );
    }

    #[test]
    fn test_all_duplicate_page_still_progresses() {
        let (mut tree, listing) = listing_tree(Some("t3_a"));
        let mut engine = PaginationEngine::new(0);
        engine.attach(&tree, listing);

        let ticket = engine.begin_load(&mut tree).unwrap();
        let merged = engine
            .merge_response(&mut tree, &ticket, Ok(page(&["t3_a"], Some("t3_z"))))
            .unwrap();
        assert_eq!(merged.inserted, 0);
        assert_eq!(merged.duplicates, 1);
        assert_eq!(engine.page_count(), 1);
        assert_eq!(engine.cursor(), &PageCursor::at("t3_z"));
    }

    #[test]
    fn test_missing_next_cursor_exhausts() {
        let (mut tree, listing) = listing_tree(Some("t3_a"));
        let mut engine = PaginationEngine::new(0);
        engine.attach(&tree, listing);

        let ticket = engine.begin_load(&mut tree).unwrap();
        engine
            .merge_response(&mut tree, &ticket, Ok(page(&["t3_b"], None)))
            .unwrap();
        assert_eq!(engine.finish_page(&mut tree), PaginationState::Exhausted);
        assert_eq!(engine.begin_load(&mut tree), None);
    }

    #[test]
    fn test_failure_keeps_cursor_and_offers_retry() {
        let (mut tree, listing) = listing_tree(Some("t3_a"));
        let mut engine = PaginationEngine::new(0);
        engine.attach(&tree, listing);

        let ticket = engine.begin_load(&mut tree).unwrap();
        let outcome = engine.merge_response(
            &mut tree,
            &ticket,
            Ok(PageResponse::with_status(500, "")),
        );
        assert_matches!(outcome, Err(PaginationFailure::Network(_)));
        assert_eq!(engine.state(), PaginationState::Idle);
        assert_eq!(engine.cursor(), &PageCursor::at("t3_a"));

        let marker = engine.error_marker().unwrap();
        assert_eq!(tree.get_attribute(marker, attrs::ROLE), Some(RETRY_ROLE));
        assert_eq!(
            tree.get_attribute(marker, attrs::LABEL),
            Some("Error loading next page. Click to retry.")
        );

        let retry = engine.retry(&mut tree).unwrap();
        assert_eq!(retry.cursor, "t3_a");
        assert_eq!(tree.kind(marker), None);
        assert_eq!(engine.requests_issued(), 2);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let (mut tree, listing) = listing_tree(Some("t3_a"));
        let mut engine = PaginationEngine::new(0);
        engine.attach(&tree, listing);

        let first = engine.begin_load(&mut tree).unwrap();
        engine
            .merge_response(&mut tree, &first, Err(NetworkFailure::rejected("t3_a", "reset")))
            .unwrap_err();
        let second = engine.retry(&mut tree).unwrap();

        assert_matches!(
            engine.merge_response(&mut tree, &first, Ok(page(&["t3_b"], Some("t3_b")))),
            Err(PaginationFailure::StaleTicket { generation: 1 })
        );
        assert_eq!(posts(&tree), 1);
        assert!(engine.is_current(&second));
    }

    #[test]
    fn test_pause_and_resume() {
        let (mut tree, listing) = listing_tree(Some("p1"));
        let mut engine = PaginationEngine::new(2);
        engine.attach(&tree, listing);

        for (i, next) in ["p2", "p3"].into_iter().enumerate() {
            let ticket = engine.begin_load(&mut tree).unwrap();
            let id = format!("t3_page{i}");
            engine
                .merge_response(&mut tree, &ticket, Ok(page(&[id.as_str()], Some(next))))
                .unwrap();
            engine.finish_page(&mut tree);
        }

        assert_eq!(engine.state(), PaginationState::Paused);
        assert_eq!(engine.begin_load(&mut tree), None);
        let marker = engine.pause_marker().unwrap();
        assert_eq!(
            tree.get_attribute(marker, attrs::LABEL),
            Some("Paused after 2 pages. Click to load more.")
        );

        let ticket = engine.resume(&mut tree).unwrap();
        assert_eq!(ticket.cursor, "p3");
        assert_eq!(engine.page_count(), 0);
        assert_eq!(tree.kind(marker), None);
    }
}
