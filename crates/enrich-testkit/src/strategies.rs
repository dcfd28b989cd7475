//! Property test strategies for feeds and pages.
//!
//! Identities are drawn from a small pool so generated pages overlap with the
//! initial feed and with each other.

use proptest::prelude::*;

pub use proptest;

use crate::fixtures::post_id;

/// Size of the identity pool
pub const POOL: usize = 24;

/// One post identity from the pool
pub fn arb_post_id() -> impl Strategy<Value = String> {
    (0..POOL).prop_map(post_id)
}

/// Identities of one fetched page, possibly repeating and overlapping
pub fn arb_page_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_post_id(), 0..8)
}

/// A sequence of fetched pages
pub fn arb_pages() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(arb_page_ids(), 1..5)
}

/// Size of the initial feed
pub fn arb_feed_size() -> impl Strategy<Value = usize> {
    0..POOL / 2
}

/// How many dispatcher passes to repeat over the same region
pub fn arb_repeats() -> impl Strategy<Value = usize> {
    1usize..4
}
