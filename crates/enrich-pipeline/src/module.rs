//! Enrichment modules and the module set
//!
//! A module is an independent unit that transforms one content node at a
//! time. Modules are gated by a boolean feature flag and must be idempotent
//! with respect to the Idempotency Registry: the dispatcher guarantees each
//! module sees each node at most once.

use std::fmt;

use enrich_core::{ContentTree, FeatureConfig, NodeId};

use crate::errors::ModuleError;
use crate::registry::ModuleId;

/// One enrichment module.
pub trait EnrichmentModule {
    /// Stable module identifier, used for processing marks
    fn id(&self) -> ModuleId;

    /// External feature flag key gating this module
    fn feature(&self) -> &'static str;

    /// Re-read settings; called at registration and on settings change
    fn configure(&mut self, _config: &FeatureConfig) {}

    /// Transform a single content node
    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError>;
}

/// Ordered set of registered modules.
///
/// Registration order is dispatch order. Registering a module whose id is
/// already present replaces the previous instance in place.
#[derive(Default)]
pub struct ModuleSet {
    modules: Vec<Box<dyn EnrichmentModule>>,
}

impl ModuleSet {
    /// Create an empty module set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module
    pub fn register(&mut self, module: Box<dyn EnrichmentModule>) {
        let id = module.id();
        match self.modules.iter().position(|m| m.id() == id) {
            Some(index) => self.modules[index] = module,
            None => self.modules.push(module),
        }
    }

    /// Check whether a module is registered
    pub fn is_registered(&self, id: ModuleId) -> bool {
        self.modules.iter().any(|m| m.id() == id)
    }

    /// Look a module up by id
    pub fn get(&self, id: ModuleId) -> Option<&dyn EnrichmentModule> {
        self.modules
            .iter()
            .find(|m| m.id() == id)
            .map(|m| &**m)
    }

    /// Registered module ids in dispatch order
    pub fn ids(&self) -> Vec<ModuleId> {
        self.modules.iter().map(|m| m.id()).collect()
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is registered
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Push new settings into every module
    pub fn configure_all(&mut self, config: &FeatureConfig) {
        for module in &mut self.modules {
            module.configure(config);
        }
    }

    /// Modules whose feature flag is on, in dispatch order
    pub fn enabled_mut(&mut self, config: &FeatureConfig) -> Vec<&mut dyn EnrichmentModule> {
        let mut enabled: Vec<&mut dyn EnrichmentModule> = Vec::new();
        for module in &mut self.modules {
            if config.flag(module.feature()) {
                enabled.push(&mut **module);
            }
        }
        enabled
    }
}

impl fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSet")
            .field("modules", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        id: &'static str,
        feature: &'static str,
    }

    impl EnrichmentModule for Named {
        fn id(&self) -> ModuleId {
            ModuleId::new(self.id)
        }

        fn feature(&self) -> &'static str {
            self.feature
        }

        fn process(&mut self, _tree: &mut dyn ContentTree, _node: NodeId) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    fn named(id: &'static str, feature: &'static str) -> Box<dyn EnrichmentModule> {
        Box::new(Named { id, feature })
    }

    #[test]
    fn test_register_keeps_order_and_replaces_by_id() {
        let mut set = ModuleSet::new();
        set.register(named("filter", "postFiltering"));
        set.register(named("commentDepth", "commentDepthIndicators"));
        set.register(named("filter", "adBlocker"));

        assert_eq!(
            set.ids(),
            vec![ModuleId::new("filter"), ModuleId::new("commentDepth")]
        );
        assert_eq!(set.len(), 2);
        assert!(set.is_registered(ModuleId::new("commentDepth")));
        assert_eq!(
            set.get(ModuleId::new("filter")).map(|m| m.feature()),
            Some("adBlocker")
        );
    }

    #[test]
    fn test_enabled_follows_feature_flags() {
        let mut set = ModuleSet::new();
        set.register(named("filter", "postFiltering"));
        set.register(named("adBlock", "adBlocker"));
        set.register(named("custom", "myCustomFlag"));

        let config = FeatureConfig::default().with_flag("myCustomFlag", true);
        let enabled: Vec<_> = set.enabled_mut(&config).iter().map(|m| m.id()).collect();
        assert_eq!(enabled, vec![ModuleId::new("filter"), ModuleId::new("custom")]);
    }

    #[test]
    fn test_debug_lists_ids() {
        let mut set = ModuleSet::new();
        set.register(named("filter", "postFiltering"));
        assert_eq!(format!("{set:?}"), "ModuleSet { modules: [ModuleId(\"filter\")] }");
    }
}
