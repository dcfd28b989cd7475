//! Pagination Engine
//!
//! Infinite scrolling over an opaque page cursor. A load is split into
//! synchronous transitions around the single suspension point (the network
//! request):
//!
//! 1. [`PaginationEngine::begin_load`] checks and sets `Loading` and places the
//!    progress marker, returning a [`FetchTicket`].
//! 2. The caller awaits [`PageSource::request_page`].
//! 3. [`PaginationEngine::merge_response`] merges the new items after the
//!    marker, or turns the marker into a retry affordance.
//! 4. [`PaginationEngine::finish_page`] settles on `Idle`, `Paused` or
//!    `Exhausted` once the merged region has been dispatched.
//!
//! Because step 1 never suspends, a second trigger while a request is in
//! flight sees `Loading` and is refused.

mod cursor;
mod engine;
mod merge;
mod scroll;
mod source;

pub use cursor::PageCursor;
pub use engine::{
    FetchTicket, MergedPage, PaginationEngine, PaginationState, BOUNDARY_ROLE, PAUSE_ROLE,
    RETRY_ROLE,
};
pub use merge::{merge_items, MergeSummary};
pub use scroll::{ScrollMetrics, ScrollObserver, ScrollSignal};
pub use source::{decode_response, PageResponse, PageSource};
