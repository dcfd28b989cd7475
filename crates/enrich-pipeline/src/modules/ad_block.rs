//! Promoted-post suppression through a stylesheet rule.

use enrich_core::{attrs, ContentTree, NodeId, NodeKind, Selector, StyleRule};

use crate::errors::ModuleError;
use crate::module::EnrichmentModule;
use crate::registry::ModuleId;

/// Installs one `display: none` rule for promoted posts.
///
/// The rule is owned by `adBlock`, so the safety guard can attribute and
/// withdraw it.
#[derive(Debug, Clone, Default)]
pub struct AdBlockModule {
    promoted_seen: usize,
}

impl AdBlockModule {
    /// Module identifier
    pub const ID: ModuleId = ModuleId::new("adBlock");

    /// Rule installed by this module
    pub fn rule() -> StyleRule {
        StyleRule::hide(
            Self::ID.as_str(),
            Selector::All(vec![
                Selector::Kind(NodeKind::Post),
                Selector::attr_eq(attrs::PROMOTED, "true"),
            ]),
        )
    }

    /// Promoted posts seen so far
    pub fn promoted_seen(&self) -> usize {
        self.promoted_seen
    }
}

impl EnrichmentModule for AdBlockModule {
    fn id(&self) -> ModuleId {
        Self::ID
    }

    fn feature(&self) -> &'static str {
        "adBlocker"
    }

    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        let installed = tree
            .style_rules()
            .iter()
            .any(|rule| rule.owner == Self::ID.as_str());
        if !installed {
            tracing::debug!("Installing promoted-post rule");
            tree.add_style_rule(Self::rule());
        }
        if tree.get_attribute(node, attrs::PROMOTED) == Some("true") {
            self.promoted_seen += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrich_core::{MemoryTree, NodeSpec};

    #[test]
    fn test_rule_installed_once_and_hides_promoted_only() {
        let mut tree = MemoryTree::from_spec(NodeSpec::listing().with_children([
            NodeSpec::post("t3_ad").with_attr(attrs::PROMOTED, "true"),
            NodeSpec::post("t3_a"),
        ]))
        .unwrap();
        let ad = tree.find_by_identity("t3_ad").unwrap();
        let a = tree.find_by_identity("t3_a").unwrap();

        let mut module = AdBlockModule::default();
        module.process(&mut tree, ad).unwrap();
        module.process(&mut tree, a).unwrap();

        assert_eq!(tree.style_rules().len(), 1);
        assert_eq!(module.promoted_seen(), 1);
        assert!(!tree.is_rendered(ad));
        assert!(tree.is_rendered(a));
    }
}
