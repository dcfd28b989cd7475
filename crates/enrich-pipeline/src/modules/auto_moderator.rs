//! Collapses comments left by moderation bots.

use enrich_core::{attrs, ContentTree, NodeId, NodeKind};

use crate::errors::ModuleError;
use crate::module::EnrichmentModule;
use crate::registry::ModuleId;

const BOT_AUTHORS: [&str; 2] = ["AutoModerator", "BotDefense"];

/// Sets the site-native collapsed state on bot comments.
#[derive(Debug, Clone, Default)]
pub struct AutoModeratorModule {
    collapsed: usize,
}

impl AutoModeratorModule {
    /// Module identifier
    pub const ID: ModuleId = ModuleId::new("hideAutoModerator");

    /// Number of comments collapsed so far
    pub fn collapsed(&self) -> usize {
        self.collapsed
    }
}

impl EnrichmentModule for AutoModeratorModule {
    fn id(&self) -> ModuleId {
        Self::ID
    }

    fn feature(&self) -> &'static str {
        "hideAutoModerator"
    }

    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        if tree.kind(node) != Some(NodeKind::Comment) {
            return Ok(());
        }
        let is_bot = tree
            .get_attribute(node, attrs::AUTHOR)
            .is_some_and(|author| BOT_AUTHORS.contains(&author));
        if is_bot && tree.get_attribute(node, attrs::COLLAPSED) != Some("true") {
            tree.set_attribute(node, attrs::COLLAPSED, "true")?;
            self.collapsed += 1;
        }
        Ok(())
    }
}
