//! # Enrich Core - Content Tree Foundation
//!
//! Foundation types for the incremental enrichment pipeline:
//! - [`ContentTree`]: the adapter through which the externally-owned tree of
//!   posts and comments is queried and mutated
//! - [`MemoryTree`]: arena + index implementation used by tests and replay
//! - [`DocumentOrder`]: the single lazy, restartable traversal
//! - [`ParsedPage`]: decoded page markup (candidate items + next cursor)
//! - [`FeatureConfig`]: flat feature flags read from the settings store
//!
//! ## Design Principles
//!
//! - **Handles, not ownership**: the pipeline holds [`NodeId`]s only
//! - **Bookkeeping stays out of the tree**: no pipeline state is written as
//!   node attributes unless it is a user-visible enrichment
//! - **Stale handles are errors**: removed slots are never reused

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod identifiers;
pub mod markup;
pub mod memory;
pub mod node;
pub mod outline;
pub mod selector;
pub mod style;
pub mod traversal;
pub mod tree;

pub use config::{FeatureConfig, FilterRules};
pub use errors::{ConfigError, ParseFailure, TreeError};
pub use identifiers::NodeId;
pub use markup::{parse_page, ParsedPage};
pub use memory::MemoryTree;
pub use node::{attrs, Display, NodeKind, NodeSpec};
pub use outline::outline;
pub use selector::Selector;
pub use style::StyleRule;
pub use traversal::{content_nodes, DocumentOrder};
pub use tree::ContentTree;
