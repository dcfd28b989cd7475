//! In-memory content tree
//!
//! Arena + index implementation of [`ContentTree`]. Slots are tombstoned on
//! removal and never reused, so every [`NodeId`] names at most one node for
//! the lifetime of the tree. An identity index gives constant-time duplicate
//! detection for merges.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::errors::TreeError;
use crate::identifiers::NodeId;
use crate::node::{Display, NodeKind, NodeSpec};
use crate::style::StyleRule;
use crate::tree::ContentTree;

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    identity: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    display: Display,
    children_display: Display,
}

/// Arena-backed content tree.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    slots: Vec<Option<Slot>>,
    by_identity: HashMap<String, NodeId>,
    rules: Vec<StyleRule>,
    root: NodeId,
}

impl MemoryTree {
    /// Create a tree holding only an empty document root
    pub fn new() -> Self {
        let root_slot = Slot {
            kind: NodeKind::Document,
            identity: None,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            display: Display::Default,
            children_display: Display::Default,
        };
        Self {
            slots: vec![Some(root_slot)],
            by_identity: HashMap::new(),
            rules: Vec::new(),
            root: NodeId::from_index(0),
        }
    }

    /// Build a tree from a document description.
    ///
    /// A root that is not a `Document` is placed under a fresh document root.
    pub fn from_spec(spec: NodeSpec) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        if spec.kind == NodeKind::Document {
            let root = tree.root;
            if let Some(slot) = tree.slot_mut(root) {
                slot.attributes = spec.attributes;
            }
            for child in spec.children {
                tree.append_child(root, child)?;
            }
        } else {
            let root = tree.root;
            tree.append_child(root, spec)?;
        }
        Ok(tree)
    }

    /// Number of live nodes, including the root
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether only the root is present
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn slot(&self, node: NodeId) -> Option<&Slot> {
        self.slots.get(node.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, node: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(node.index()).and_then(Option::as_mut)
    }

    fn live_slot_mut(&mut self, node: NodeId) -> Result<&mut Slot, TreeError> {
        self.slot_mut(node).ok_or(TreeError::unknown(node))
    }

    /// Reject a subtree whose identities collide with the tree or with each other.
    fn check_identities(&self, spec: &NodeSpec) -> Result<(), TreeError> {
        let mut seen = HashSet::new();
        let mut pending = vec![spec];
        while let Some(current) = pending.pop() {
            if let Some(id) = &current.id {
                if self.by_identity.contains_key(id) || !seen.insert(id.as_str()) {
                    tracing::debug!(identity = %id, "Rejected subtree with duplicate identity");
                    return Err(TreeError::DuplicateIdentity {
                        identity: id.clone(),
                    });
                }
            }
            pending.extend(current.children.iter());
        }
        Ok(())
    }

    /// Allocate a subtree under `parent` without linking it into the
    /// parent's child list.
    fn allocate(&mut self, spec: NodeSpec, parent: NodeId) -> NodeId {
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        let node = NodeId::from_index(index);
        if let Some(id) = &spec.id {
            self.by_identity.insert(id.clone(), node);
        }
        self.slots.push(Some(Slot {
            kind: spec.kind,
            identity: spec.id,
            parent: Some(parent),
            children: Vec::new(),
            attributes: spec.attributes,
            display: Display::Default,
            children_display: Display::Default,
        }));

        let children: Vec<NodeId> = spec
            .children
            .into_iter()
            .map(|child| self.allocate(child, node))
            .collect();
        if let Some(slot) = self.slot_mut(node) {
            slot.children = children;
        }
        node
    }

    fn insert_at(
        &mut self,
        parent: NodeId,
        position: usize,
        spec: NodeSpec,
    ) -> Result<NodeId, TreeError> {
        self.check_identities(&spec)?;
        let node = self.allocate(spec, parent);
        let slot = self.live_slot_mut(parent)?;
        let position = position.min(slot.children.len());
        slot.children.insert(position, node);
        Ok(node)
    }

    fn tombstone(&mut self, node: NodeId) {
        let Some(slot) = self.slots.get_mut(node.index()).and_then(Option::take) else {
            return;
        };
        if let Some(id) = slot.identity {
            self.by_identity.remove(&id);
        }
        for child in slot.children {
            self.tombstone(child);
        }
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree for MemoryTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.slot(node).map(|slot| slot.kind)
    }

    fn identity(&self, node: NodeId) -> Option<&str> {
        self.slot(node).and_then(|slot| slot.identity.as_deref())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).and_then(|slot| slot.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.slot(node)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    fn find_by_identity(&self, identity: &str) -> Option<NodeId> {
        self.by_identity.get(identity).copied()
    }

    fn get_attribute(&self, node: NodeId, key: &str) -> Option<&str> {
        self.slot(node)
            .and_then(|slot| slot.attributes.get(key))
            .map(String::as_str)
    }

    fn set_attribute(&mut self, node: NodeId, key: &str, value: &str) -> Result<(), TreeError> {
        self.live_slot_mut(node)?
            .attributes
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, key: &str) -> Result<(), TreeError> {
        self.live_slot_mut(node)?.attributes.remove(key);
        Ok(())
    }

    fn insert_after(&mut self, anchor: NodeId, spec: NodeSpec) -> Result<NodeId, TreeError> {
        let parent = match self.slot(anchor) {
            None => return Err(TreeError::unknown(anchor)),
            Some(slot) => slot
                .parent
                .ok_or_else(|| TreeError::invalid_placement(anchor, "the root has no siblings"))?,
        };
        let position = self
            .children(parent)
            .iter()
            .position(|child| *child == anchor)
            .map_or(0, |index| index + 1);
        self.insert_at(parent, position, spec)
    }

    fn append_child(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId, TreeError> {
        let position = match self.slot(parent) {
            None => return Err(TreeError::unknown(parent)),
            Some(slot) => slot.children.len(),
        };
        self.insert_at(parent, position, spec)
    }

    fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::invalid_placement(node, "the root cannot be removed"));
        }
        let parent = self
            .slot(node)
            .ok_or(TreeError::unknown(node))?
            .parent;
        if let Some(parent) = parent.and_then(|parent| self.slot_mut(parent)) {
            parent.children.retain(|child| *child != node);
        }
        self.tombstone(node);
        tracing::debug!(node = ?node, live = self.len(), "Removed subtree");
        Ok(())
    }

    fn inline_display(&self, node: NodeId) -> Display {
        self.slot(node).map(|slot| slot.display).unwrap_or_default()
    }

    fn set_inline_display(&mut self, node: NodeId, display: Display) -> Result<(), TreeError> {
        self.live_slot_mut(node)?.display = display;
        Ok(())
    }

    fn children_display(&self, node: NodeId) -> Display {
        self.slot(node)
            .map(|slot| slot.children_display)
            .unwrap_or_default()
    }

    fn set_children_display(&mut self, node: NodeId, display: Display) -> Result<(), TreeError> {
        self.live_slot_mut(node)?.children_display = display;
        Ok(())
    }

    fn style_rules(&self) -> &[StyleRule] {
        &self.rules
    }

    fn add_style_rule(&mut self, rule: StyleRule) {
        self.rules.push(rule);
    }

    fn remove_style_rules(&mut self, owner: &str) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.owner != owner);
        let removed = before - self.rules.len();
        if removed > 0 {
            tracing::debug!(owner, removed, "Withdrew stylesheet rules");
        }
        removed
    }
}
