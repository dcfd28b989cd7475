//! # Enrich Pipeline - Incremental Enrichment Over a Content Tree
//!
//! Applies a set of independent enrichment modules to a tree of posts and
//! comments that keeps growing while the user reads:
//!
//! - [`Dispatcher`]: runs every enabled module at most once per node, keeping
//!   its [`ProcessingRegistry`] out of the tree
//! - [`PaginationEngine`]: infinite scrolling with one request in flight,
//!   de-duplicating merge, pause and retry affordances
//! - [`CollapseStateMachine`]: per-comment and page-wide collapse with
//!   synchronized control labels
//! - [`SafetyGuard`]: restores content when modules over-hide it
//! - [`PipelineContext`]: the explicit owner of all of the above for one page
//!   view
//!
//! ## Failure Policy
//!
//! No error stops the pipeline. Module failures are isolated per node, page
//! failures leave a retry affordance, and the safety guard only ever restores
//! content. The worst outcome is a missing enhancement, never a blank feed.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut tree = MemoryTree::from_spec(page)?;
//! let mut context = PipelineContext::with_builtin_modules(config);
//! context.initialize(&mut tree);
//! while let Some(report) = context.load_next_page(&mut tree, &source).await {
//!     // ...
//! }
//! ```

#![forbid(unsafe_code)]

pub mod collapse;
pub mod context;
pub mod dispatcher;
pub mod errors;
pub mod expansion;
pub mod keyboard;
pub mod module;
pub mod modules;
pub mod pagination;
pub mod registry;
pub mod safety;

pub use collapse::{
    page_toggle_label, toggle_label, CollapseEntry, CollapseModule, CollapsePhase,
    CollapseSettings, CollapseStateMachine,
};
pub use context::{ExpansionReport, PageLoadReport, PipelineContext};
pub use dispatcher::{DispatchReport, Dispatcher, ModuleFailure, Region};
pub use errors::{CollapseError, ExpansionError, ModuleError, NetworkFailure, PaginationFailure};
pub use expansion::{ExpandedThread, MORE_COMMENTS_ROLE};
pub use keyboard::{KeyChord, ShortcutAction};
pub use module::{EnrichmentModule, ModuleSet};
pub use modules::{
    builtin_modules, AdBlockModule, AutoModeratorModule, CommentDepthModule, FilterModule,
};
pub use pagination::{
    FetchTicket, MergedPage, PageCursor, PageResponse, PageSource, PaginationEngine,
    PaginationState, ScrollMetrics, ScrollObserver, ScrollSignal,
};
pub use registry::{ModuleId, ProcessingMark, ProcessingRegistry};
pub use safety::{SafetyAudit, SafetyGuard, SafetyViolation, ViolationKind};
