//! Scripted network source and instrumented modules.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use enrich_core::{attrs, ContentTree, Display, NodeId};
use enrich_pipeline::{
    EnrichmentModule, ModuleError, ModuleId, NetworkFailure, PageResponse, PageSource,
};
use parking_lot::Mutex;

type Scripted = Result<PageResponse, NetworkFailure>;

/// Page source answering from a per-cursor script.
///
/// Responses for one cursor are served in order; the last one repeats.
/// Unscripted cursors answer `404`.
#[derive(Debug, Default)]
pub struct ScriptedPageSource {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl ScriptedPageSource {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page for `cursor`
    pub fn with_page(self, cursor: &str, body: impl Into<String>) -> Self {
        self.push(cursor, Ok(PageResponse::ok(body)));
        self
    }

    /// Queue an arbitrary outcome for `cursor`
    pub fn with_response(self, cursor: &str, response: Scripted) -> Self {
        self.push(cursor, response);
        self
    }

    /// Queue a transport failure for `cursor`
    pub fn with_failure(self, cursor: &str) -> Self {
        self.push(cursor, Err(NetworkFailure::rejected(cursor, "scripted failure")));
        self
    }

    /// Queue an outcome after construction
    pub fn push(&self, cursor: &str, response: Scripted) {
        self.script
            .lock()
            .entry(cursor.to_string())
            .or_default()
            .push_back(response);
    }

    /// Number of requests served
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Cursors requested, in order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedPageSource {
    async fn request_page(&self, cursor: &str) -> Result<PageResponse, NetworkFailure> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(cursor.to_string());

        let mut script = self.script.lock();
        match script.get_mut(cursor) {
            Some(queue) if queue.len() > 1 => queue.pop_front().expect("queue is non-empty"),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(PageResponse::with_status(404, ""))),
            None => Ok(PageResponse::with_status(404, "")),
        }
    }
}

/// Shared log of the nodes a test module processed.
pub type CallLog = Arc<Mutex<Vec<NodeId>>>;

/// Module that records every node it processes.
#[derive(Debug)]
pub struct CountingModule {
    id: &'static str,
    feature: &'static str,
    calls: CallLog,
}

impl CountingModule {
    /// Create a counting module and the handle to read its log
    pub fn new(id: &'static str, feature: &'static str) -> (Self, CallLog) {
        let calls = CallLog::default();
        (
            Self {
                id,
                feature,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl EnrichmentModule for CountingModule {
    fn id(&self) -> ModuleId {
        ModuleId::new(self.id)
    }

    fn feature(&self) -> &'static str {
        self.feature
    }

    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        self.calls.lock().push(node);
        tree.set_attribute(node, &format!("data-{}", self.id), "1")?;
        Ok(())
    }
}

/// Module that fails on every node, after recording it.
#[derive(Debug)]
pub struct FailingModule {
    feature: &'static str,
    calls: CallLog,
}

impl FailingModule {
    /// Module identifier
    pub const ID: ModuleId = ModuleId::new("alwaysFails");

    /// Create a failing module and the handle to read its log
    pub fn new(feature: &'static str) -> (Self, CallLog) {
        let calls = CallLog::default();
        (
            Self {
                feature,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl EnrichmentModule for FailingModule {
    fn id(&self) -> ModuleId {
        Self::ID
    }

    fn feature(&self) -> &'static str {
        self.feature
    }

    fn process(&mut self, _tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        self.calls.lock().push(node);
        Err(ModuleError::failed(format!("refusing {node}")))
    }
}

/// Buggy filter that hides every top-level item inline.
#[derive(Debug, Default)]
pub struct HideEverythingModule;

impl HideEverythingModule {
    /// Module identifier
    pub const ID: ModuleId = ModuleId::new("hideEverything");
}

impl EnrichmentModule for HideEverythingModule {
    fn id(&self) -> ModuleId {
        Self::ID
    }

    fn feature(&self) -> &'static str {
        "postFiltering"
    }

    fn process(&mut self, tree: &mut dyn ContentTree, node: NodeId) -> Result<(), ModuleError> {
        if tree.is_top_level(node) {
            tree.set_inline_display(node, Display::None)?;
            tree.set_attribute(node, attrs::HIDDEN_MARKER, "1")?;
        }
        Ok(())
    }
}
