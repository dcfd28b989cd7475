//! Safety Guard
//!
//! Post-pass check for pathological over-hiding. Runs once per page view,
//! shortly after the first full dispatcher pass. It only ever restores
//! content; it never hides anything.
//!
//! Items carrying [`attrs::USER_HIDDEN`] were hidden by the user and are left
//! alone: they count towards neither condition and are never restored.

use std::collections::BTreeSet;
use std::time::Duration;

use enrich_core::{attrs, ContentTree, Display, FeatureConfig, NodeId, NodeKind, Selector};

/// Which over-hiding condition fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Every item that is not user-hidden is invisible
    AllItemsHidden,
    /// At least the configured share of items is hidden by stylesheet rules
    StylesheetSuppression,
}

/// A detected and remediated over-suppression of content.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Safety violation ({kind:?}): {hidden} of {total} items hidden; restored {restored}, withdrew {rules_removed} rules")]
pub struct SafetyViolation {
    /// Condition that fired
    pub kind: ViolationKind,
    /// Top-level items inspected
    pub total: usize,
    /// Items that were hidden, excluding user-hidden ones
    pub hidden: usize,
    /// Items made visible again
    pub restored: usize,
    /// Stylesheet rules withdrawn
    pub rules_removed: usize,
    /// Owners of the withdrawn rules
    pub rule_owners: Vec<String>,
}

/// Visibility census of the top-level items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyAudit {
    /// Top-level items
    pub total: usize,
    /// Items currently rendered
    pub visible: usize,
    /// Items hidden by the user
    pub user_hidden: usize,
    /// Items hidden inline or carrying the hide marker (user-hidden excluded)
    pub inline_hidden: usize,
    /// Items hidden by stylesheet rules (user-hidden excluded)
    pub stylesheet_hidden: usize,
}

/// Over-hiding detector and remediator.
#[derive(Debug, Clone)]
pub struct SafetyGuard {
    delay: Duration,
    hidden_ratio: f64,
    has_run: bool,
}

impl SafetyGuard {
    /// Create a guard
    pub fn new(delay: Duration, hidden_ratio: f64) -> Self {
        Self {
            delay,
            hidden_ratio,
            has_run: false,
        }
    }

    /// Create a guard from the feature configuration
    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(config.safety_guard_delay(), config.safety_hidden_ratio)
    }

    /// Change delay and threshold; does not re-arm a guard that already ran
    pub fn configure(&mut self, config: &FeatureConfig) {
        self.delay = config.safety_guard_delay();
        self.hidden_ratio = config.safety_hidden_ratio;
    }

    /// Settling delay before the guard runs
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether the guard has already run for this page view
    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// Count visible and hidden top-level items
    pub fn audit(&self, tree: &dyn ContentTree) -> SafetyAudit {
        let mut audit = SafetyAudit::default();
        for item in top_level_items(tree) {
            audit.total += 1;
            if tree.is_rendered(item) {
                audit.visible += 1;
            }
            if is_user_hidden(tree, item) {
                audit.user_hidden += 1;
                continue;
            }
            if tree.inline_display(item).is_none()
                || tree.get_attribute(item, attrs::HIDDEN_MARKER).is_some()
            {
                audit.inline_hidden += 1;
            }
            if tree.hidden_by_stylesheet(item) {
                audit.stylesheet_hidden += 1;
            }
        }
        audit
    }

    /// Pure check: which condition, if any, holds right now
    pub fn inspect(&self, tree: &dyn ContentTree) -> Option<ViolationKind> {
        let audit = self.audit(tree);
        let attributable = audit.total - audit.user_hidden;
        if attributable == 0 {
            return None;
        }
        if audit.visible == 0 {
            return Some(ViolationKind::AllItemsHidden);
        }
        if audit.stylesheet_hidden > 0
            && audit.stylesheet_hidden as f64 >= self.hidden_ratio * audit.total as f64
        {
            return Some(ViolationKind::StylesheetSuppression);
        }
        None
    }

    /// Check and remediate, at most once per page view
    pub fn run(&mut self, tree: &mut dyn ContentTree) -> Option<SafetyViolation> {
        if self.has_run {
            tracing::debug!("Safety guard already ran");
            return None;
        }
        self.has_run = true;
        self.enforce(tree)
    }

    /// Check and remediate regardless of earlier runs
    pub fn enforce(&self, tree: &mut dyn ContentTree) -> Option<SafetyViolation> {
        let before = self.audit(&*tree);
        if before.total == 0 {
            let has_listing = !tree
                .query_region(tree.root(), &Selector::Kind(NodeKind::Listing))
                .is_empty();
            if has_listing {
                tracing::warn!("Listing has no top-level items");
            }
            return None;
        }
        let kind = self.inspect(&*tree)?;
        let items: Vec<NodeId> = top_level_items(&*tree)
            .into_iter()
            .filter(|item| !is_user_hidden(&*tree, *item))
            .collect();

        if kind == ViolationKind::AllItemsHidden {
            for item in &items {
                let restored = if tree.inline_display(*item).is_none() {
                    tree.set_inline_display(*item, Display::Default)
                } else {
                    Ok(())
                };
                let cleared =
                    restored.and_then(|()| tree.remove_attribute(*item, attrs::HIDDEN_MARKER));
                if let Err(error) = cleared {
                    tracing::warn!(item = ?item, error = %error, "Could not restore item");
                }
            }
        }

        let owners: BTreeSet<String> = tree
            .style_rules()
            .iter()
            .filter(|rule| items.iter().any(|item| rule.selector.matches(&*tree, *item)))
            .map(|rule| rule.owner.clone())
            .collect();
        let mut rules_removed = 0;
        for owner in &owners {
            rules_removed += tree.remove_style_rules(owner);
        }

        let after = self.audit(&*tree);
        let violation = SafetyViolation {
            kind,
            total: before.total,
            hidden: items.len().saturating_sub(before.visible),
            restored: after.visible.saturating_sub(before.visible),
            rules_removed,
            rule_owners: owners.into_iter().collect(),
        };
        tracing::error!(
            kind = ?violation.kind,
            total = violation.total,
            hidden = violation.hidden,
            restored = violation.restored,
            rules_removed = violation.rules_removed,
            owners = ?violation.rule_owners,
            "Safety violation: content over-suppressed, restored"
        );
        Some(violation)
    }
}

fn top_level_items(tree: &dyn ContentTree) -> Vec<NodeId> {
    tree.query_region(tree.root(), &Selector::TopLevelItem)
}

fn is_user_hidden(tree: &dyn ContentTree, item: NodeId) -> bool {
    tree.get_attribute(item, attrs::USER_HIDDEN).is_some()
}
