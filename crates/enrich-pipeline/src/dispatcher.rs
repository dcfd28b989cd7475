//! Dispatcher
//!
//! Runs every enabled module over a newly available region, at most once per
//! (module, node) pair. The per-node loop is synchronous: nothing suspends
//! between processing a node and recording its mark.

use enrich_core::{content_nodes, ContentTree, NodeId};

use crate::errors::ModuleError;
use crate::module::EnrichmentModule;
use crate::registry::{ModuleId, ProcessingRegistry};

/// Part of the tree handed to a dispatcher pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// The whole subtree rooted at a node
    Subtree(NodeId),
    /// Ordered item roots, e.g. the items merged from one page
    Items(Vec<NodeId>),
}

impl Region {
    /// Roots of the region in document order
    pub fn roots(&self) -> &[NodeId] {
        match self {
            Region::Subtree(root) => std::slice::from_ref(root),
            Region::Items(items) => items,
        }
    }

    /// Whether the region has no roots
    pub fn is_empty(&self) -> bool {
        self.roots().is_empty()
    }
}

/// A module failed on one node; the mark was recorded anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    /// Module that failed
    pub module: ModuleId,
    /// Node it failed on
    pub node: NodeId,
    /// What went wrong
    pub error: ModuleError,
}

/// Outcome of one dispatcher pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// `process` invocations, including failed ones
    pub processed: usize,
    /// (module, node) pairs skipped because they were already marked
    pub skipped: usize,
    /// Isolated failures
    pub failures: Vec<ModuleFailure>,
}

impl DispatchReport {
    /// Whether no module failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one
    pub fn absorb(&mut self, other: DispatchReport) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

/// Owner of the Idempotency Registry.
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: ProcessingRegistry,
    passes: u64,
}

impl Dispatcher {
    /// Create a dispatcher with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Processing marks recorded so far
    pub fn registry(&self) -> &ProcessingRegistry {
        &self.registry
    }

    /// Number of completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run `modules` over the content nodes of `region`.
    ///
    /// Each module walks the region in document order. A node is marked for a
    /// module once `process` returns, whether it succeeded or not, so a failing
    /// or no-op module is never retried on the same node. Nodes removed by an
    /// earlier module are skipped.
    pub fn dispatch(
        &mut self,
        tree: &mut dyn ContentTree,
        region: &Region,
        modules: &mut [&mut dyn EnrichmentModule],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for module in modules.iter_mut() {
            let id = module.id();
            for root in region.roots() {
                for node in content_nodes(&*tree, *root) {
                    if tree.kind(node).is_none() {
                        continue;
                    }
                    if self.registry.is_marked(id, node) {
                        report.skipped += 1;
                        continue;
                    }

                    let outcome = module.process(tree, node);
                    self.registry.mark(id, node);
                    report.processed += 1;

                    if let Err(error) = outcome {
                        tracing::warn!(module = %id, node = ?node, error = %error, "Enrichment module failed");
                        report.failures.push(ModuleFailure {
                            module: id,
                            node,
                            error,
                        });
                    }
                }
            }
        }

        self.passes += 1;
        tracing::debug!(
            pass = self.passes,
            roots = region.roots().len(),
            processed = report.processed,
            skipped = report.skipped,
            failures = report.failures.len(),
            "Dispatcher pass complete"
        );
        report
    }

    /// Drop marks of nodes that have left the tree
    pub fn prune(&mut self, tree: &dyn ContentTree) -> usize {
        self.registry.prune(tree)
    }
}
