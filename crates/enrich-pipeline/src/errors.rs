//! Pipeline error taxonomy
//!
//! - [`NetworkFailure`] and [`ParseFailure`] are recovered locally through the
//!   retry affordance; both surface as [`PaginationFailure`].
//! - [`ModuleError`] is isolated per module and node by the dispatcher.
//! - [`CollapseError`] and [`ExpansionError`] report misuse of user-facing
//!   operations; they never leave the page in a partial state.
//!
//! Safety violations are reports rather than errors; see
//! [`SafetyViolation`](crate::safety::SafetyViolation).

use enrich_core::{NodeId, ParseFailure, TreeError};

/// A page request failed before any markup was available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkFailure {
    /// The request was rejected by the network layer
    #[error("Request for '{cursor}' failed: {reason}")]
    Rejected {
        /// Cursor that was requested
        cursor: String,
        /// Transport-level reason
        reason: String,
    },

    /// The server answered with a non-success status
    #[error("Request for '{cursor}' returned status {status}")]
    Status {
        /// Cursor that was requested
        cursor: String,
        /// HTTP status code
        status: u16,
    },

    /// The network layer gave up waiting
    #[error("Request for '{cursor}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Cursor that was requested
        cursor: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },
}

impl NetworkFailure {
    /// Create a rejected-request failure
    pub fn rejected(cursor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            cursor: cursor.into(),
            reason: reason.into(),
        }
    }
}

/// Any failure while loading and merging one page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationFailure {
    /// The request failed
    #[error(transparent)]
    Network(#[from] NetworkFailure),

    /// The response could not be parsed into nodes
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    /// The tree rejected the merge
    #[error("Merge failed: {0}")]
    Tree(#[from] TreeError),

    /// The completion belongs to a fetch that is no longer current
    #[error("Fetch generation {generation} is stale")]
    StaleTicket {
        /// Generation of the stale ticket
        generation: u64,
    },
}

impl PaginationFailure {
    /// Whether the failure leaves a retry affordance behind
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PaginationFailure::StaleTicket { .. })
    }
}

/// An enrichment module failed on one node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    /// A tree operation failed
    #[error("Tree operation failed: {0}")]
    Tree(#[from] TreeError),

    /// The module reported a failure of its own
    #[error("Module failed: {message}")]
    Failed {
        /// What went wrong
        message: String,
    },
}

impl ModuleError {
    /// Create a module-specific failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Collapse operations on nodes that cannot take them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollapseError {
    /// Collapse controls are disabled by configuration
    #[error("Comment collapsing is disabled")]
    Disabled,

    /// The node has no child comments, or is not a comment at all
    #[error("{node} has no collapsible children")]
    NotCollapsible {
        /// Target of the rejected toggle
        node: NodeId,
    },

    /// A tree operation failed
    #[error("Tree operation failed: {0}")]
    Tree(#[from] TreeError),
}

/// Inline thread expansion failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    /// Thread expansion is disabled by configuration
    #[error("Thread expansion is disabled")]
    Disabled,

    /// The node is not a "continue this thread" marker with a target
    #[error("{node} is not an expandable thread marker")]
    NotExpandable {
        /// Target of the rejected expansion
        node: NodeId,
    },

    /// The thread has already been loaded inline
    #[error("{node} has already been expanded")]
    AlreadyExpanded {
        /// Target of the rejected expansion
        node: NodeId,
    },

    /// Loading or merging the thread failed
    #[error(transparent)]
    Failure(#[from] PaginationFailure),
}
