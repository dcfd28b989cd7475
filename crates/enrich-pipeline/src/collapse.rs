//! Collapse State Machine
//!
//! Tracks the `Expanded`/`Collapsed` phase of every comment with child
//! comments, the page-wide "hide all" state and the labels of the controls
//! that flip them.
//!
//! Collapsing a node suppresses its child container. Descendants keep their
//! own phase; they are hidden only as a consequence of the ancestor.
//!
//! The page-wide flag lives in a `tokio::sync::watch` channel.
//! [`CollapseStateMachine::set_all`] is its only writer; the keyboard handler,
//! the page toggle and the pagination merge step read it through
//! [`CollapseStateMachine::all_hidden`] or a subscribed receiver.

use std::collections::{HashMap, HashSet};

use enrich_core::{
    attrs, ContentTree, Display, DocumentOrder, FeatureConfig, NodeId, NodeKind, NodeSpec,
    Selector, TreeError,
};
use tokio::sync::watch;

use crate::errors::{CollapseError, ModuleError};
use crate::module::EnrichmentModule;
use crate::registry::ModuleId;

/// Role of a per-comment toggle control
pub const TOGGLE_ROLE: &str = "collapse-toggle";
/// Role of the page-wide toggle control
pub const PAGE_TOGGLE_ROLE: &str = "collapse-toggle-all";

/// Phase of one collapsible comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollapsePhase {
    /// Children rendered
    Expanded,
    /// Child container suppressed
    Collapsed,
}

impl CollapsePhase {
    /// Phase for a hidden flag
    pub fn from_hidden(hidden: bool) -> Self {
        if hidden {
            CollapsePhase::Collapsed
        } else {
            CollapsePhase::Expanded
        }
    }

    /// The other phase
    pub fn flipped(self) -> Self {
        match self {
            CollapsePhase::Expanded => CollapsePhase::Collapsed,
            CollapsePhase::Collapsed => CollapsePhase::Expanded,
        }
    }
}

/// Collapse bookkeeping for one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseEntry {
    /// Current phase
    pub phase: CollapsePhase,
    /// Count shown in the label, fixed when the entry is created
    pub child_count: usize,
    /// Whether the comment sits directly under the listing
    pub top_level: bool,
    /// Toggle control, when one was built
    pub control: Option<NodeId>,
}

/// Collapse options read from the feature configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseSettings {
    /// Build toggle controls on nested comments too
    pub nested_controls: bool,
    /// "Hide all" also collapses nested comments with children
    pub hide_nested: bool,
    /// New top-level comments start collapsed
    pub hide_by_default: bool,
}

impl CollapseSettings {
    /// Read the collapse flags
    pub fn from_config(config: &FeatureConfig) -> Self {
        Self {
            nested_controls: config.collapse_child_comments_nested,
            hide_nested: config.collapse_child_comments_hide_nested,
            hide_by_default: config.collapse_child_comments_default,
        }
    }
}

/// Label of a per-comment toggle: `"hide 3 children"`, `"show 1 child"`.
pub fn toggle_label(phase: CollapsePhase, count: usize) -> String {
    let verb = match phase {
        CollapsePhase::Expanded => "hide",
        CollapsePhase::Collapsed => "show",
    };
    let noun = if count == 1 { "child" } else { "children" };
    format!("[{}] {verb} {count} {noun}", toggle_glyph(phase))
}

fn toggle_glyph(phase: CollapsePhase) -> char {
    match phase {
        CollapsePhase::Expanded => '–',
        CollapsePhase::Collapsed => '+',
    }
}

/// Label of the page-wide toggle
pub fn page_toggle_label(all_hidden: bool) -> &'static str {
    if all_hidden {
        "show all child comments"
    } else {
        "hide all child comments"
    }
}

/// Per-comment and page-wide collapse state.
#[derive(Debug)]
pub struct CollapseStateMachine {
    settings: CollapseSettings,
    entries: HashMap<NodeId, CollapseEntry>,
    touched: HashSet<NodeId>,
    page_toggle: Option<NodeId>,
    all_hidden: watch::Sender<bool>,
}

impl CollapseStateMachine {
    /// Create a state machine with nothing observed yet
    pub fn new(settings: CollapseSettings) -> Self {
        let (all_hidden, _) = watch::channel(false);
        Self {
            settings,
            entries: HashMap::new(),
            touched: HashSet::new(),
            page_toggle: None,
            all_hidden,
        }
    }

    /// Replace the settings; existing entries keep their controls
    pub fn configure(&mut self, settings: CollapseSettings) {
        self.settings = settings;
    }

    /// Active settings
    pub fn settings(&self) -> CollapseSettings {
        self.settings
    }

    /// Receiver notified on every page-wide state change
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.all_hidden.subscribe()
    }

    /// Last page-wide state chosen
    pub fn all_hidden(&self) -> bool {
        *self.all_hidden.borrow()
    }

    /// Bookkeeping of one comment
    pub fn entry(&self, node: NodeId) -> Option<&CollapseEntry> {
        self.entries.get(&node)
    }

    /// Phase of one comment
    pub fn phase(&self, node: NodeId) -> Option<CollapsePhase> {
        self.entries.get(&node).map(|entry| entry.phase)
    }

    /// Current label of one comment's toggle
    pub fn label(&self, node: NodeId) -> Option<String> {
        self.entries
            .get(&node)
            .map(|entry| toggle_label(entry.phase, entry.child_count))
    }

    /// Number of comments under collapse bookkeeping
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no comment has been observed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Page-wide toggle control, when installed
    pub fn page_toggle(&self) -> Option<NodeId> {
        self.page_toggle
    }

    /// Build the page-wide toggle beside the listing. Installing twice
    /// returns the existing control.
    pub fn install_page_toggle(
        &mut self,
        tree: &mut dyn ContentTree,
        listing: NodeId,
    ) -> Result<NodeId, TreeError> {
        if let Some(existing) = self.page_toggle.filter(|node| tree.kind(*node).is_some()) {
            return Ok(existing);
        }
        let area = tree.parent(listing).unwrap_or_else(|| tree.root());
        let control = tree.append_child(
            area,
            NodeSpec::control(PAGE_TOGGLE_ROLE, page_toggle_label(self.all_hidden())),
        )?;
        self.page_toggle = Some(control);
        tracing::debug!(control = ?control, "Installed page-wide collapse toggle");
        Ok(control)
    }

    /// First sight of a node: create its entry and control if it is a comment
    /// with child comments. A new top-level comment starts collapsed while
    /// the page-wide state is "hidden".
    pub fn observe(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), TreeError> {
        if tree.kind(node) != Some(NodeKind::Comment) || self.entries.contains_key(&node) {
            return Ok(());
        }
        let direct = tree.children_of_kind(node, NodeKind::Comment).len();
        let child_count = if direct > 0 {
            direct
        } else {
            tree.query_region(node, &Selector::Kind(NodeKind::Comment))
                .len()
                .saturating_sub(1)
        };
        if child_count == 0 {
            return Ok(());
        }

        let top_level = tree.is_top_level(node);
        let control = if top_level || self.settings.nested_controls {
            let mut spec = NodeSpec::control(
                TOGGLE_ROLE,
                toggle_label(CollapsePhase::Expanded, child_count),
            );
            if let Some(identity) = tree.identity(node) {
                spec = spec.with_attr(attrs::CONTROLS, identity);
            }
            Some(tree.insert_after(node, spec)?)
        } else {
            None
        };

        self.entries.insert(
            node,
            CollapseEntry {
                phase: CollapsePhase::Expanded,
                child_count,
                top_level,
                control,
            },
        );

        if top_level && (self.all_hidden() || self.settings.hide_by_default) {
            self.apply(tree, node, CollapsePhase::Collapsed)?;
            self.touched.insert(node);
        }
        Ok(())
    }

    /// Flip one comment. `target` may be the comment or its toggle control.
    pub fn toggle(
        &mut self,
        tree: &mut dyn ContentTree,
        target: NodeId,
    ) -> Result<CollapsePhase, CollapseError> {
        let node = self
            .resolve(&*tree, target)
            .ok_or(CollapseError::NotCollapsible { node: target })?;
        let phase = self
            .phase(node)
            .ok_or(CollapseError::NotCollapsible { node })?
            .flipped();
        self.apply(tree, node, phase)?;
        tracing::debug!(node = ?node, phase = ?phase, "Toggled comment");
        Ok(phase)
    }

    /// Set the page-wide state.
    ///
    /// Hiding collapses every top-level comment with children, and with
    /// `hide_nested` every nested one too. Showing expands every top-level
    /// comment and every node touched by earlier page-wide hides. Returns the
    /// number of comments whose phase changed.
    pub fn set_all(&mut self, tree: &mut dyn ContentTree, hide: bool) -> Result<usize, TreeError> {
        self.all_hidden.send_replace(hide);
        if let Some(control) = self.page_toggle.filter(|node| tree.kind(*node).is_some()) {
            tree.set_attribute(control, attrs::LABEL, page_toggle_label(hide))?;
        }

        let comments: Vec<NodeId> = DocumentOrder::new(&*tree, tree.root())
            .filter(|node| tree.kind(*node) == Some(NodeKind::Comment))
            .collect();
        let wanted = CollapsePhase::from_hidden(hide);
        let mut changed = 0;

        for node in comments {
            self.observe(tree, node)?;
            let Some(entry) = self.entries.get(&node) else {
                continue;
            };
            if !(entry.top_level || (hide && self.settings.hide_nested)) {
                continue;
            }
            if entry.phase != wanted {
                self.apply(tree, node, wanted)?;
                changed += 1;
            }
            if hide {
                self.touched.insert(node);
            }
        }

        if !hide {
            let touched: Vec<NodeId> = self.touched.drain().collect();
            for node in touched {
                if tree.kind(node).is_none() {
                    continue;
                }
                if self.phase(node) == Some(CollapsePhase::Collapsed) {
                    self.apply(tree, node, CollapsePhase::Expanded)?;
                    changed += 1;
                }
            }
        }

        tracing::info!(hide, changed, "Page-wide collapse state changed");
        Ok(changed)
    }

    /// Alias of [`set_all`](Self::set_all) for UI layers that think in toggles
    pub fn toggle_all(&mut self, tree: &mut dyn ContentTree, hide: bool) -> Result<usize, TreeError> {
        self.set_all(tree, hide)
    }

    /// Forget entries of removed nodes
    pub fn prune(&mut self, tree: &dyn ContentTree) {
        self.entries.retain(|node, _| tree.kind(*node).is_some());
        self.touched.retain(|node| tree.kind(*node).is_some());
    }

    fn resolve(&self, tree: &dyn ContentTree, target: NodeId) -> Option<NodeId> {
        if self.entries.contains_key(&target) {
            return Some(target);
        }
        if tree.kind(target) != Some(NodeKind::Control) {
            return None;
        }
        tree.get_attribute(target, attrs::CONTROLS)
            .and_then(|identity| tree.find_by_identity(identity))
            .filter(|node| self.entries.contains_key(node))
    }

    fn apply(
        &mut self,
        tree: &mut dyn ContentTree,
        node: NodeId,
        phase: CollapsePhase,
    ) -> Result<(), TreeError> {
        let Some(entry) = self.entries.get_mut(&node) else {
            return Ok(());
        };
        tree.set_children_display(node, Display::hidden(phase == CollapsePhase::Collapsed))?;
        entry.phase = phase;
        if let Some(control) = entry.control {
            if tree.kind(control).is_some() {
                tree.set_attribute(control, attrs::LABEL, &toggle_label(phase, entry.child_count))?;
            }
        }
        Ok(())
    }
}

/// Enrichment module driving a [`CollapseStateMachine`].
#[derive(Debug)]
pub struct CollapseModule {
    machine: CollapseStateMachine,
}

impl CollapseModule {
    /// Module identifier
    pub const ID: ModuleId = ModuleId::new("collapse");
    /// Feature flag gating the module
    pub const FEATURE: &str = "collapseChildComments";

    /// Create the module
    pub fn new(settings: CollapseSettings) -> Self {
        Self {
            machine: CollapseStateMachine::new(settings),
        }
    }

    /// State machine
    pub fn machine(&self) -> &CollapseStateMachine {
        &self.machine
    }

    /// Mutable state machine
    pub fn machine_mut(&mut self) -> &mut CollapseStateMachine {
        &mut self.machine
    }
}

impl EnrichmentModule for CollapseModule {
    fn id(&self) -> ModuleId {
        Self::ID
    }

    fn feature(&self) -> &'static str {
        Self::FEATURE
    }

    fn configure(&mut self, config: &FeatureConfig) {
        self.machine.configure(CollapseSettings::from_config(config));
    }

    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        self.machine.observe(tree, node)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use enrich_core::MemoryTree;

    fn thread() -> MemoryTree {
        MemoryTree::from_spec(NodeSpec::listing().with_children([
            NodeSpec::comment("t1_a").with_children([
                NodeSpec::comment("t1_a1").with_child(NodeSpec::comment("t1_a1x")),
                NodeSpec::comment("t1_a2"),
                NodeSpec::comment("t1_a3"),
            ]),
            NodeSpec::comment("t1_b"),
        ]))
        .unwrap()
    }

    fn observe_all(machine: &mut CollapseStateMachine, tree: &mut MemoryTree) {
        for node in tree.query_region(tree.root(), &Selector::Kind(NodeKind::Comment)) {
            machine.observe(tree, node).unwrap();
        }
    }

    fn id(tree: &MemoryTree, identity: &str) -> NodeId {
        tree.find_by_identity(identity).unwrap()
    }

    #[test]
    fn test_labels() {
        assert_eq!(toggle_label(CollapsePhase::Expanded, 3), "[–] hide 3 children");
        assert_eq!(toggle_label(CollapsePhase::Collapsed, 1), "[+] show 1 child");
        assert_eq!(page_toggle_label(false), "hide all child comments");
    }

    #[test]
    fn test_controls_only_on_top_level_by_default() {
        let mut tree = thread();
        let mut machine = CollapseStateMachine::new(CollapseSettings::default());
        observe_all(&mut machine, &mut tree);

        let a = id(&tree, "t1_a");
        let entry = machine.entry(a).unwrap();
        assert_eq!(entry.child_count, 3);
        assert!(entry.top_level);
        let control = entry.control.unwrap();
        assert_eq!(tree.get_attribute(control, attrs::CONTROLS), Some("t1_a"));
        assert_eq!(tree.parent(control), tree.parent(a));

        let a1 = id(&tree, "t1_a1");
        assert_eq!(machine.entry(a1).unwrap().control, None);
        assert_eq!(machine.entry(id(&tree, "t1_b")), None);
    }

    #[test]
    fn test_observe_is_idempotent() {
        let mut tree = thread();
        let mut machine = CollapseStateMachine::new(CollapseSettings::default());
        observe_all(&mut machine, &mut tree);
        let nodes = tree.len();
        observe_all(&mut machine, &mut tree);
        assert_eq!(tree.len(), nodes);
    }

    #[test]
    fn test_toggle_hides_children_and_flips_label() {
        let mut tree = thread();
        let mut machine = CollapseStateMachine::new(CollapseSettings::default());
        observe_all(&mut machine, &mut tree);
        let a = id(&tree, "t1_a");
        let control = machine.entry(a).unwrap().control.unwrap();

        assert_eq!(machine.toggle(&mut tree, control).unwrap(), CollapsePhase::Collapsed);
        for child in ["t1_a1", "t1_a1x", "t1_a2", "t1_a3"] {
            assert!(!tree.is_rendered(id(&tree, child)), "{child} still rendered");
        }
        assert!(tree.is_rendered(a));
        assert_eq!(tree.get_attribute(control, attrs::LABEL), Some("[+] show 3 children"));
        assert_eq!(machine.phase(id(&tree, "t1_a1")), Some(CollapsePhase::Expanded));

        assert_eq!(machine.toggle(&mut tree, a).unwrap(), CollapsePhase::Expanded);
        assert!(tree.is_rendered(id(&tree, "t1_a1x")));
        assert_eq!(tree.get_attribute(control, attrs::LABEL), Some("[–] hide 3 children"));
    }

    #[test]
    fn test_toggle_rejects_leaf_comment() {
        let mut tree = thread();
        let mut machine = CollapseStateMachine::new(CollapseSettings::default());
        observe_all(&mut machine, &mut tree);
        let b = id(&tree, "t1_b");
        assert_matches!(
            machine.toggle(&mut tree, b),
            Err(CollapseError::NotCollapsible { node }) if node == b
        );
    }

    #[test]
    fn test_set_all_top_level_only_unless_hide_nested() {
        let mut tree = thread();
        let mut machine = CollapseStateMachine::new(CollapseSettings::default());
        observe_all(&mut machine, &mut tree);
        let mut rx = machine.subscribe();

        machine.set_all(&mut tree, true).unwrap();
        assert!(machine.all_hidden());
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert_eq!(machine.phase(id(&tree, "t1_a")), Some(CollapsePhase::Collapsed));
        assert_eq!(machine.phase(id(&tree, "t1_a1")), Some(CollapsePhase::Expanded));

        machine.set_all(&mut tree, false).unwrap();
        assert_eq!(machine.phase(id(&tree, "t1_a")), Some(CollapsePhase::Expanded));

        machine.configure(CollapseSettings {
            hide_nested: true,
            ..CollapseSettings::default()
        });
        machine.set_all(&mut tree, true).unwrap();
        assert_eq!(machine.phase(id(&tree, "t1_a1")), Some(CollapsePhase::Collapsed));

        let changed = machine.set_all(&mut tree, false).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(machine.phase(id(&tree, "t1_a1")), Some(CollapsePhase::Expanded));
    }

    #[test]
    fn test_page_toggle_label_follows_state() {
        let mut tree = thread();
        let listing = tree.query_region(tree.root(), &Selector::Kind(NodeKind::Listing))[0];
        let mut machine = CollapseStateMachine::new(CollapseSettings::default());
        let control = machine.install_page_toggle(&mut tree, listing).unwrap();
        assert_eq!(machine.install_page_toggle(&mut tree, listing).unwrap(), control);

        machine.set_all(&mut tree, true).unwrap();
        assert_eq!(tree.get_attribute(control, attrs::LABEL), Some("show all child comments"));
    }

    #[test]
    fn test_new_top_level_comment_collapses_while_all_hidden() {
        let mut tree = thread();
        let mut machine = CollapseStateMachine::new(CollapseSettings::default());
        observe_all(&mut machine, &mut tree);
        machine.set_all(&mut tree, true).unwrap();

        let b = id(&tree, "t1_b");
        let late = tree
            .insert_after(
                b,
                NodeSpec::comment("t1_c").with_child(NodeSpec::comment("t1_c1")),
            )
            .unwrap();
        machine.observe(&mut tree, late).unwrap();

        assert_eq!(machine.phase(late), Some(CollapsePhase::Collapsed));
        assert!(!tree.is_rendered(id(&tree, "t1_c1")));
    }
}
