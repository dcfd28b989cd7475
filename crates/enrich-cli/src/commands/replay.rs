//! Replay a captured page through the pipeline

use anyhow::{Context, Result};
use enrich_core::{outline, ContentTree, FeatureConfig, MemoryTree, NodeSpec};
use enrich_pipeline::{
    PageLoadReport, PageSource, PaginationState, PipelineContext, SafetyViolation,
    ScrollMetrics,
};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::source::DirectoryPageSource;

/// A viewport sitting at the very bottom of the document
const AT_BOTTOM: ScrollMetrics = ScrollMetrics {
    viewport_bottom: 10_000,
    document_height: 10_000,
};

/// What a replay did to the page
#[derive(Debug)]
pub struct ReplaySummary {
    /// Outline of the final tree
    pub outline: String,
    /// Nodes in the final tree
    pub nodes: usize,
    /// Pages merged after the captured one
    pub pages_merged: u32,
    /// Page requests issued
    pub requests: u64,
    /// Page loads that failed
    pub failures: usize,
    /// Module failures across all dispatcher passes
    pub module_failures: usize,
    /// Pagination state at the end
    pub state: PaginationState,
    /// What the safety guard restored, if anything
    pub violation: Option<SafetyViolation>,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pages merged: {}, requests: {}, page failures: {}, module failures: {}",
            self.pages_merged, self.requests, self.failures, self.module_failures
        )?;
        writeln!(f, "pagination: {:?}, nodes: {}", self.state, self.nodes)?;
        match &self.violation {
            Some(violation) => write!(f, "safety guard: {violation}"),
            None => write!(f, "safety guard: ok"),
        }
    }
}

/// Load `page`, initialize the pipeline, simulate `scrolls` scroll-to-bottom
/// events served from `pages`, then run the safety guard.
pub async fn run(
    page: &Path,
    pages: &Path,
    config: FeatureConfig,
    scrolls: u32,
) -> Result<ReplaySummary> {
    let input = tokio::fs::read_to_string(page)
        .await
        .with_context(|| format!("Failed to read page {}", page.display()))?;
    let spec: NodeSpec = serde_json::from_str(&input)
        .with_context(|| format!("Failed to decode page {}", page.display()))?;
    let mut tree = MemoryTree::from_spec(spec).context("Captured page is not a valid tree")?;
    let source = DirectoryPageSource::new(pages);
    replay(&mut tree, &source, config, scrolls).await
}

/// Drive an already built tree
pub async fn replay(
    tree: &mut MemoryTree,
    source: &DirectoryPageSource,
    config: FeatureConfig,
    scrolls: u32,
) -> Result<ReplaySummary> {
    // Scroll events are spaced one interval apart so none is rate-limited.
    let spacing = config.scroll_interval() + Duration::from_millis(1);
    let mut context = PipelineContext::with_builtin_modules(config);
    let first = context.initialize(tree);
    let mut module_failures = first.failures.len();
    let mut failures = 0;

    let start = Instant::now();
    for scroll in 0..scrolls {
        let now = start + spacing * scroll;
        let Some(ticket) = context.on_scroll(tree, now, AT_BOTTOM) else {
            tracing::info!(scroll, state = ?context.pagination_state(), "No page load due");
            if context.pagination_state() == PaginationState::Exhausted {
                break;
            }
            continue;
        };
        let response = source.request_page(&ticket.cursor).await;
        match context.complete_page_load(tree, &ticket, response) {
            PageLoadReport::Merged { page, dispatch, .. } => {
                module_failures += dispatch.failures.len();
                tracing::info!(
                    page = page.page_number,
                    inserted = page.inserted,
                    duplicates = page.duplicates,
                    "Merged page"
                );
            }
            PageLoadReport::Failed(error) => {
                failures += 1;
                tracing::warn!(cursor = %ticket.cursor, error = %error, "Page load failed");
            }
            PageLoadReport::Stale => {}
        }
    }

    let violation = context.run_safety_guard(tree);
    Ok(ReplaySummary {
        outline: outline(&*tree, tree.root()),
        nodes: tree.len(),
        pages_merged: context.pagination().pages_merged(),
        requests: context.pagination().requests_issued(),
        failures,
        module_failures,
        state: context.pagination_state(),
        violation,
    })
}
