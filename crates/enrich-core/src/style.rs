//! Stylesheet-level hide rules.
//!
//! Some modules suppress content without touching individual nodes, the way an
//! injected `<style>` element does. Those rules are tracked here, tagged with
//! the module that owns them, so they can be audited and withdrawn.

use crate::selector::Selector;

/// A `display: none` rule applied to every node its selector matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// Module (or other party) that installed the rule
    pub owner: String,
    /// Nodes hidden by the rule
    pub selector: Selector,
}

impl StyleRule {
    /// Create a hide rule
    pub fn hide(owner: impl Into<String>, selector: Selector) -> Self {
        Self {
            owner: owner.into(),
            selector,
        }
    }
}
