//! Built-in enrichment modules
//!
//! Each module is gated by its own feature flag and processes one content node
//! per call. The collapse module lives in [`crate::collapse`] because the
//! pipeline context drives its state machine directly.

mod ad_block;
mod auto_moderator;
mod comment_depth;
mod filter;

pub use ad_block::AdBlockModule;
pub use auto_moderator::AutoModeratorModule;
pub use comment_depth::{CommentDepthModule, DEPTH_ATTR, DEPTH_BAND_ATTR};
pub use filter::FilterModule;

use crate::module::EnrichmentModule;

/// Default set of built-in modules, in dispatch order
pub fn builtin_modules() -> Vec<Box<dyn EnrichmentModule>> {
    vec![
        Box::new(FilterModule::default()),
        Box::new(AdBlockModule::default()),
        Box::new(CommentDepthModule),
        Box::new(AutoModeratorModule::default()),
    ]
}
