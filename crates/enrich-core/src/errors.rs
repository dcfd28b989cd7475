//! Error types for the content tree, page markup and settings.
//!
//! Each concern gets its own small error enum so callers can match on the
//! failure they actually care about. The pipeline crate folds these into its
//! own recovery taxonomy.

use crate::identifiers::NodeId;

/// Errors raised by a [`ContentTree`](crate::ContentTree) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The handle does not refer to a live node (never allocated or removed)
    #[error("Unknown node: {node}")]
    UnknownNode {
        /// The stale or foreign handle
        node: NodeId,
    },

    /// A node with this identity already exists in the tree
    #[error("Duplicate identity: {identity}")]
    DuplicateIdentity {
        /// The identity that collided
        identity: String,
    },

    /// The requested placement is not possible (e.g. a sibling of the root)
    #[error("Invalid placement relative to {node}: {reason}")]
    InvalidPlacement {
        /// Anchor node of the rejected placement
        node: NodeId,
        /// Why the placement was rejected
        reason: String,
    },
}

impl TreeError {
    /// Create an unknown node error
    pub fn unknown(node: NodeId) -> Self {
        Self::UnknownNode { node }
    }

    /// Create an invalid placement error
    pub fn invalid_placement(node: NodeId, reason: impl Into<String>) -> Self {
        Self::InvalidPlacement {
            node,
            reason: reason.into(),
        }
    }
}

/// A fetched page could not be turned into candidate nodes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    /// The markup is not a decodable page document
    #[error("Malformed page markup: {message}")]
    Malformed {
        /// Decoder message
        message: String,
    },

    /// An item root is not a post or comment
    #[error("Page item {index} has non-content kind '{kind}'")]
    NonContentItem {
        /// Position of the offending item in the page
        index: usize,
        /// Kind found at the item root
        kind: String,
    },
}

impl ParseFailure {
    /// Create a malformed markup failure
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Settings could not be decoded into a [`FeatureConfig`](crate::FeatureConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML settings failed to decode
    #[error("Invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON settings (export format) failed to decode
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// A value decoded but is out of range
    #[error("Invalid setting '{key}': {message}")]
    Invalid {
        /// External key of the setting
        key: String,
        /// What is wrong with it
        message: String,
    },
}
