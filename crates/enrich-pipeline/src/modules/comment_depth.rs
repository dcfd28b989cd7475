//! Comment depth indicators.

use enrich_core::{ContentTree, NodeId, NodeKind};

use crate::errors::ModuleError;
use crate::module::EnrichmentModule;
use crate::registry::ModuleId;

/// Attribute holding the number of comment ancestors
pub const DEPTH_ATTR: &str = "data-rel-depth";
/// Attribute holding the colour band (depth mod 10)
pub const DEPTH_BAND_ATTR: &str = "data-rel-depth-band";

const BANDS: usize = 10;

/// Writes depth and colour band attributes on every comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentDepthModule;

impl CommentDepthModule {
    /// Module identifier
    pub const ID: ModuleId = ModuleId::new("commentDepth");
}

impl EnrichmentModule for CommentDepthModule {
    fn id(&self) -> ModuleId {
        Self::ID
    }

    fn feature(&self) -> &'static str {
        "commentDepthIndicators"
    }

    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        if tree.kind(node) != Some(NodeKind::Comment) {
            return Ok(());
        }
        let depth = tree.depth_of(node, NodeKind::Comment);
        tree.set_attribute(node, DEPTH_ATTR, &depth.to_string())?;
        tree.set_attribute(node, DEPTH_BAND_ATTR, &(depth % BANDS).to_string())?;
        Ok(())
    }
}
