//! Pipeline context
//!
//! One explicit owner for everything a page view needs: feature
//! configuration, the dispatcher and its registry, the module set, the
//! collapse module, the pagination engine, the scroll observer and the safety
//! guard. Independent contexts share nothing.
//!
//! All mutation happens on one execution context. The only suspension points
//! are the page and thread requests inside [`PipelineContext::load_next_page`],
//! [`PipelineContext::retry_page`], [`PipelineContext::resume_pagination`] and
//! [`PipelineContext::expand_thread`], plus the settling delay of
//! [`PipelineContext::settle_and_guard`].

use std::time::Instant;

use enrich_core::{ContentTree, FeatureConfig, NodeId, NodeKind, Selector};
use tokio::sync::watch;

use crate::collapse::{CollapseModule, CollapsePhase, CollapseSettings, CollapseStateMachine};
use crate::dispatcher::{DispatchReport, Dispatcher, Region};
use crate::errors::{CollapseError, ExpansionError, NetworkFailure, PaginationFailure};
use crate::expansion::{begin_expansion, complete_expansion, ExpandedThread};
use crate::keyboard::{resolve, KeyChord, ShortcutAction};
use crate::module::{EnrichmentModule, ModuleSet};
use crate::modules::builtin_modules;
use crate::pagination::{
    FetchTicket, MergedPage, PageResponse, PageSource, PaginationEngine, PaginationState,
    ScrollMetrics, ScrollObserver, ScrollSignal,
};
use crate::registry::ModuleId;
use crate::safety::{SafetyGuard, SafetyViolation};

/// Outcome of completing one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoadReport {
    /// The page was merged and dispatched
    Merged {
        /// What was merged
        page: MergedPage,
        /// Dispatcher pass over the merged region
        dispatch: DispatchReport,
        /// State after the page settled
        state: PaginationState,
    },
    /// The load failed; a retry affordance is in place
    Failed(PaginationFailure),
    /// The completion belonged to a superseded fetch and was ignored
    Stale,
}

/// Outcome of expanding one thread continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionReport {
    /// What was merged
    pub thread: ExpandedThread,
    /// Dispatcher pass over the merged region
    pub dispatch: DispatchReport,
}

/// Per-page-view pipeline state.
#[derive(Debug)]
pub struct PipelineContext {
    config: FeatureConfig,
    dispatcher: Dispatcher,
    modules: ModuleSet,
    collapse: CollapseModule,
    pagination: PaginationEngine,
    scroll: ScrollObserver,
    safety: SafetyGuard,
    listing: Option<NodeId>,
    initialized: bool,
}

impl PipelineContext {
    /// Create a context with no enrichment modules besides collapse
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            modules: ModuleSet::new(),
            collapse: CollapseModule::new(CollapseSettings::from_config(&config)),
            pagination: PaginationEngine::new(config.ner_pause_after_pages),
            scroll: ScrollObserver::new(config.scroll_interval(), config.ner_distance_threshold),
            safety: SafetyGuard::from_config(&config),
            listing: None,
            initialized: false,
            config,
        }
    }

    /// Create a context with the built-in modules registered
    pub fn with_builtin_modules(config: FeatureConfig) -> Self {
        let mut context = Self::new(config);
        for module in builtin_modules() {
            context.register_module(module);
        }
        context
    }

    /// Register a module; it is configured immediately
    pub fn register_module(&mut self, mut module: Box<dyn EnrichmentModule>) {
        module.configure(&self.config);
        tracing::debug!(module = %module.id(), feature = module.feature(), "Registered module");
        self.modules.register(module);
    }

    /// Active configuration
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Registered modules
    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Dispatcher and its processing marks
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Collapse state machine
    pub fn collapse(&self) -> &CollapseStateMachine {
        self.collapse.machine()
    }

    /// Pagination engine
    pub fn pagination(&self) -> &PaginationEngine {
        &self.pagination
    }

    /// Pagination state
    pub fn pagination_state(&self) -> PaginationState {
        self.pagination.state()
    }

    /// Safety guard
    pub fn safety(&self) -> &SafetyGuard {
        &self.safety
    }

    /// Listing found by [`initialize`](Self::initialize)
    pub fn listing(&self) -> Option<NodeId> {
        self.listing
    }

    /// Whether the first pass has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Receiver notified when the page-wide collapse state changes
    pub fn subscribe_collapse(&self) -> watch::Receiver<bool> {
        self.collapse.machine().subscribe()
    }

    /// Re-read settings after an explicit settings change.
    ///
    /// After the first pass, features switched on here are brought up on the
    /// live page: pagination attaches to the listing, the page-wide toggle is
    /// installed, and the tree is dispatched again so newly enabled modules
    /// see the nodes already present. Modules that already ran skip them.
    pub fn apply_settings(
        &mut self,
        tree: &mut dyn ContentTree,
        config: FeatureConfig,
    ) -> DispatchReport {
        self.config = config;
        self.modules.configure_all(&self.config);
        self.collapse.configure(&self.config);
        self.pagination.configure(self.config.ner_pause_after_pages);
        self.scroll
            .configure(self.config.scroll_interval(), self.config.ner_distance_threshold);
        self.safety.configure(&self.config);
        tracing::info!("Settings applied");

        if !self.initialized {
            return DispatchReport::default();
        }
        if let Some(listing) = self.listing {
            self.prepare_listing(tree, listing);
        }
        let root = tree.root();
        self.dispatch(tree, &Region::Subtree(root))
    }

    /// First full pass over the page.
    ///
    /// Locates the listing, installs the page-wide collapse toggle when the
    /// listing holds top-level comments, attaches pagination, dispatches the
    /// whole tree and applies the default "hide all".
    pub fn initialize(&mut self, tree: &mut dyn ContentTree) -> DispatchReport {
        let root = tree.root();
        self.listing = tree
            .query_region(root, &Selector::Kind(NodeKind::Listing))
            .first()
            .copied();

        if let Some(listing) = self.listing {
            self.prepare_listing(tree, listing);
        } else {
            tracing::debug!("No listing on this page");
        }

        let report = self.dispatch(tree, &Region::Subtree(root));

        if self.collapse_enabled() && self.config.collapse_child_comments_default {
            if let Err(error) = self.toggle_all(tree, true) {
                tracing::warn!(error = %error, "Could not apply default collapse");
            }
        }

        self.initialized = true;
        tracing::info!(
            processed = report.processed,
            failures = report.failures.len(),
            "Pipeline initialized"
        );
        report
    }

    /// Run every enabled module over `region`
    pub fn dispatch(&mut self, tree: &mut dyn ContentTree, region: &Region) -> DispatchReport {
        let collapse_enabled = self.collapse_enabled();
        let mut enabled = self.modules.enabled_mut(&self.config);
        if collapse_enabled {
            enabled.push(&mut self.collapse);
        }
        self.dispatcher.dispatch(tree, region, &mut enabled)
    }

    /// Handle a scroll event; starts a page load when one is due
    pub fn on_scroll(
        &mut self,
        tree: &mut dyn ContentTree,
        now: Instant,
        metrics: ScrollMetrics,
    ) -> Option<FetchTicket> {
        if !self.config.never_ending_reddit {
            return None;
        }
        match self.scroll.observe(now, metrics) {
            ScrollSignal::NearBottom => self.pagination.begin_load(tree),
            signal => {
                tracing::trace!(signal = ?signal, "Scroll event ignored");
                None
            }
        }
    }

    /// Start a page load without a scroll event
    pub fn begin_page_load(&mut self, tree: &mut dyn ContentTree) -> Option<FetchTicket> {
        if !self.config.never_ending_reddit {
            return None;
        }
        self.pagination.begin_load(tree)
    }

    /// Activate the retry affordance
    pub fn begin_retry(&mut self, tree: &mut dyn ContentTree) -> Option<FetchTicket> {
        self.pagination.retry(tree)
    }

    /// Activate the resume affordance
    pub fn begin_resume(&mut self, tree: &mut dyn ContentTree) -> Option<FetchTicket> {
        self.pagination.resume(tree)
    }

    /// Merge the response behind `ticket`, dispatch the merged region and
    /// settle the engine
    pub fn complete_page_load(
        &mut self,
        tree: &mut dyn ContentTree,
        ticket: &FetchTicket,
        response: Result<PageResponse, NetworkFailure>,
    ) -> PageLoadReport {
        match self.pagination.merge_response(tree, ticket, response) {
            Ok(page) => {
                let dispatch = self.dispatch(tree, &page.region);
                let state = self.pagination.finish_page(tree);
                PageLoadReport::Merged {
                    page,
                    dispatch,
                    state,
                }
            }
            Err(PaginationFailure::StaleTicket { .. }) => PageLoadReport::Stale,
            Err(failure) => PageLoadReport::Failed(failure),
        }
    }

    /// Load the next page end to end. `None` when no load could start.
    pub async fn load_next_page<S>(
        &mut self,
        tree: &mut dyn ContentTree,
        source: &S,
    ) -> Option<PageLoadReport>
    where
        S: PageSource + ?Sized,
    {
        let ticket = self.begin_page_load(tree)?;
        Some(self.fetch_and_complete(tree, ticket, source).await)
    }

    /// Retry the failed page end to end
    pub async fn retry_page<S>(
        &mut self,
        tree: &mut dyn ContentTree,
        source: &S,
    ) -> Option<PageLoadReport>
    where
        S: PageSource + ?Sized,
    {
        let ticket = self.begin_retry(tree)?;
        Some(self.fetch_and_complete(tree, ticket, source).await)
    }

    /// Resume a paused engine and load the next page end to end
    pub async fn resume_pagination<S>(
        &mut self,
        tree: &mut dyn ContentTree,
        source: &S,
    ) -> Option<PageLoadReport>
    where
        S: PageSource + ?Sized,
    {
        let ticket = self.begin_resume(tree)?;
        Some(self.fetch_and_complete(tree, ticket, source).await)
    }

    /// Flip one comment; `target` may be the comment or its toggle control
    pub fn toggle_comment(
        &mut self,
        tree: &mut dyn ContentTree,
        target: NodeId,
    ) -> Result<CollapsePhase, CollapseError> {
        if !self.collapse_enabled() {
            return Err(CollapseError::Disabled);
        }
        self.collapse.machine_mut().toggle(tree, target)
    }

    /// Set the page-wide collapse state; returns how many comments changed
    pub fn toggle_all(&mut self, tree: &mut dyn ContentTree, hide: bool) -> Result<usize, CollapseError> {
        if !self.collapse_enabled() {
            return Err(CollapseError::Disabled);
        }
        Ok(self.collapse.machine_mut().set_all(tree, hide)?)
    }

    /// Route a key press; returns whether it was consumed
    pub fn handle_key(&mut self, tree: &mut dyn ContentTree, chord: KeyChord) -> bool {
        match resolve(chord) {
            Some(ShortcutAction::ToggleAllComments) if self.collapse_enabled() => {
                let hide = !self.collapse.machine().all_hidden();
                match self.toggle_all(tree, hide) {
                    Ok(_) => true,
                    Err(error) => {
                        tracing::warn!(error = %error, "Shortcut failed");
                        false
                    }
                }
            }
            _ => false,
        }
    }

    /// Load a "continue this thread" marker inline and dispatch the merged
    /// comments
    pub async fn expand_thread<S>(
        &mut self,
        tree: &mut dyn ContentTree,
        anchor: NodeId,
        source: &S,
    ) -> Result<ExpansionReport, ExpansionError>
    where
        S: PageSource + ?Sized,
    {
        if !self.config.expand_continue_thread {
            return Err(ExpansionError::Disabled);
        }
        let href = begin_expansion(tree, anchor)?;
        let response = source.request_page(&href).await;
        let thread = complete_expansion(tree, anchor, &href, response)?;
        let dispatch = self.dispatch(tree, &thread.region);
        tracing::info!(href = %href, inserted = thread.inserted, "Thread expanded");
        Ok(ExpansionReport { thread, dispatch })
    }

    /// Run the safety guard now (at most once per page view)
    pub fn run_safety_guard(&mut self, tree: &mut dyn ContentTree) -> Option<SafetyViolation> {
        self.safety.run(tree)
    }

    /// Wait for the settling delay, then run the safety guard
    pub async fn settle_and_guard(&mut self, tree: &mut dyn ContentTree) -> Option<SafetyViolation> {
        tokio::time::sleep(self.safety.delay()).await;
        self.run_safety_guard(tree)
    }

    /// Whether a module id is registered or built in
    pub fn has_module(&self, id: ModuleId) -> bool {
        id == CollapseModule::ID || self.modules.is_registered(id)
    }

    /// Install the page-wide toggle and attach pagination when their
    /// features are on. Both are idempotent.
    fn prepare_listing(&mut self, tree: &mut dyn ContentTree, listing: NodeId) {
        if self.collapse_enabled() && has_top_level_comments(&*tree, listing) {
            if let Err(error) = self
                .collapse
                .machine_mut()
                .install_page_toggle(tree, listing)
            {
                tracing::warn!(error = %error, "Could not install page-wide toggle");
            }
        }
        if self.config.never_ending_reddit && !self.pagination.is_attached() {
            self.pagination.attach(&*tree, listing);
        }
    }

    fn collapse_enabled(&self) -> bool {
        self.config.flag(CollapseModule::FEATURE)
    }

    async fn fetch_and_complete<S>(
        &mut self,
        tree: &mut dyn ContentTree,
        ticket: FetchTicket,
        source: &S,
    ) -> PageLoadReport
    where
        S: PageSource + ?Sized,
    {
        let response = source.request_page(&ticket.cursor).await;
        self.complete_page_load(tree, &ticket, response)
    }
}

fn has_top_level_comments(tree: &dyn ContentTree, listing: NodeId) -> bool {
    !tree.children_of_kind(listing, NodeKind::Comment).is_empty()
}
